//! Client aggregate and phone normalisation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClientCode, ClientId};

use crate::error::ClientError;
use crate::visit::Visit;

/// Normalises a phone number for storage and uniqueness checks.
///
/// Whitespace, dashes and parentheses are removed, as is a leading `+`, so
/// `"+92 300-1234567"` and `"923001234567"` are the same number.
pub fn normalize_phone(raw: &str) -> Result<String, ClientError> {
    let stripped: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    let normalized = stripped.strip_prefix('+').unwrap_or(&stripped).to_lowercase();

    if normalized.is_empty() {
        return Err(ClientError::validation("Phone number is required"));
    }
    Ok(normalized)
}

/// A salon client with an embedded visit ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub client_id: ClientCode,
    pub name: String,
    pub phone_number: String,
    pub total_visits: u32,
    pub total_spent: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
    pub visits: Vec<Visit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Creates a client with no visits. `phone_number` must already be
    /// normalised.
    pub fn new(client_id: ClientCode, name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ClientId::new_v7(),
            client_id,
            name: name.into(),
            phone_number: phone_number.into(),
            total_visits: 0,
            total_spent: Decimal::ZERO,
            last_visit: None,
            visits: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a visit and updates the running aggregates
    pub fn record_visit(&mut self, visit: Visit) {
        self.total_visits += 1;
        self.total_spent += visit.final_amount;
        self.last_visit = Some(visit.date);
        self.updated_at = visit.date;
        self.visits.push(visit);
    }

    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            client_id: self.client_id.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            total_visits: self.total_visits,
            total_spent: self.total_spent,
            last_visit: self.last_visit,
            created_at: self.created_at,
        }
    }

    /// Case-insensitive substring match on name, phone or client code
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.phone_number.to_lowercase().contains(&needle)
            || self.client_id.as_str().to_lowercase().contains(&needle)
    }
}

/// A client without its visits, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: ClientId,
    pub client_id: ClientCode,
    pub name: String,
    pub phone_number: String,
    pub total_visits: u32,
    pub total_spent: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields that may change on a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

impl ClientUpdate {
    /// Trims the name and normalises the phone number
    pub fn normalized(self) -> Result<Self, ClientError> {
        let name = match self.name {
            Some(name) => {
                let trimmed = name.trim().to_string();
                if trimmed.is_empty() {
                    return Err(ClientError::validation("Name cannot be empty"));
                }
                Some(trimmed)
            }
            None => None,
        };
        let phone_number = self.phone_number.as_deref().map(normalize_phone).transpose()?;
        Ok(Self { name, phone_number })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none()
    }
}
