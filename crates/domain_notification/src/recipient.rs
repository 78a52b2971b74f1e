//! Staff roles and resolved recipients

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::RecipientId;

use crate::error::NotificationError;
use crate::notification::RecipientModel;

/// A role that receives broadcast notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Manager,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Manager => "manager",
        }
    }

    /// Store holding the dedicated accounts for this role
    pub fn account_model(&self) -> RecipientModel {
        match self {
            StaffRole::Admin => RecipientModel::Admin,
            StaffRole::Manager => RecipientModel::Manager,
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(StaffRole::Admin),
            "manager" => Ok(StaffRole::Manager),
            other => Err(NotificationError::validation(format!("Unknown staff role: {}", other))),
        }
    }
}

/// A resolved recipient and the store it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recipient {
    pub id: RecipientId,
    pub model: RecipientModel,
}

impl Recipient {
    pub fn new(id: RecipientId, model: RecipientModel) -> Self {
        Self { id, model }
    }
}

/// The user reading notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: RecipientId,
    /// `None` for users outside the admin/manager roles; they only see
    /// notifications addressed to them directly
    pub role: Option<StaffRole>,
}

impl Viewer {
    pub fn new(id: RecipientId, role: Option<StaffRole>) -> Self {
        Self { id, role }
    }
}
