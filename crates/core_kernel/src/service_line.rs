//! Priced service line items
//!
//! Bills hold an ordered sequence of these; insertion order is display
//! order. The same snapshot is copied onto client visits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A validated service line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub name: String,
    pub price: Decimal,
    /// Duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceLine {
    pub fn new(name: impl Into<String>, price: Decimal) -> Result<Self, CoreError> {
        ServiceLineInput {
            name: Some(name.into()),
            price: Some(price),
            duration: None,
            description: None,
        }
        .validate()
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration = Some(minutes);
        self
    }
}

/// An unvalidated service line as supplied by a caller
///
/// `name` and `price` are both required; a missing price is a validation
/// error, never an implicit zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ServiceLineInput {
    pub fn validate(self) -> Result<ServiceLine, CoreError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::validation("Each service must have a name"))?;
        let price = self
            .price
            .ok_or_else(|| CoreError::validation(format!("Service '{}' must have a price", name)))?;
        if price < Decimal::ZERO {
            return Err(CoreError::validation(format!(
                "Service '{}' has a negative price",
                name
            )));
        }
        Ok(ServiceLine {
            name,
            price,
            duration: self.duration,
            description: self.description,
        })
    }
}

/// Validates every line, failing on the first invalid one, and rejects an
/// empty list
pub fn validate_services(inputs: Vec<ServiceLineInput>) -> Result<Vec<ServiceLine>, CoreError> {
    if inputs.is_empty() {
        return Err(CoreError::validation("At least one service is required"));
    }
    inputs.into_iter().map(ServiceLineInput::validate).collect()
}

/// Sum of service prices, unrounded
pub fn services_total(services: &[ServiceLine]) -> Decimal {
    crate::money::sum(services.iter().map(|s| &s.price))
}

/// Total duration of the services, treating missing durations as zero
pub fn services_duration(services: &[ServiceLine]) -> u32 {
    services.iter().filter_map(|s| s.duration).sum()
}
