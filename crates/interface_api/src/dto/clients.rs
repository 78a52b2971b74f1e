//! Client DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::PageRequest;
use domain_client::{ClientSummary, VisitInput};

use super::common::page_request;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddClientRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
}

/// Body of `POST /clients/:clientId/visits`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddVisitRequest {
    #[serde(default)]
    pub visit_data: VisitInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListClientsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListClientsQuery {
    pub fn page_request(&self) -> PageRequest {
        page_request(self.page, self.limit, 10)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchClientsQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPhoneQuery {
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct PhoneCheck {
    pub exists: bool,
    pub client: Option<ClientSummary>,
}

impl From<Option<ClientSummary>> for PhoneCheck {
    fn from(client: Option<ClientSummary>) -> Self {
        Self {
            exists: client.is_some(),
            client,
        }
    }
}
