//! Notification entity and its vocabularies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{NotificationId, RecipientId};

use crate::error::NotificationError;
use crate::recipient::{Recipient, StaffRole, Viewer};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = NotificationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(NotificationError::validation(format!(
                        "Invalid {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

/// Kind of event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    AdvanceBookingReminder,
    AttendanceRequest,
    ExpenseRequest,
    AdvanceSalaryRequest,
    BillGenerated,
    SystemAlert,
    General,
}

string_enum!(NotificationType {
    AdvanceBookingReminder => "advance_booking_reminder",
    AttendanceRequest => "attendance_request",
    ExpenseRequest => "expense_request",
    AdvanceSalaryRequest => "advance_salary_request",
    BillGenerated => "bill_generated",
    SystemAlert => "system_alert",
    General => "general",
});

/// Audience a notification is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    Admin,
    Manager,
    Both,
}

string_enum!(RecipientType {
    Admin => "admin",
    Manager => "manager",
    Both => "both",
});

impl RecipientType {
    /// Whether a viewer with the given role belongs to this audience
    pub fn includes(&self, role: StaffRole) -> bool {
        match self {
            RecipientType::Both => true,
            RecipientType::Admin => role == StaffRole::Admin,
            RecipientType::Manager => role == StaffRole::Manager,
        }
    }
}

impl From<StaffRole> for RecipientType {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Admin => RecipientType::Admin,
            StaffRole::Manager => RecipientType::Manager,
        }
    }
}

/// Store a recipient id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientModel {
    Admin,
    Manager,
    Employee,
    User,
}

string_enum!(RecipientModel {
    Admin => "Admin",
    Manager => "Manager",
    Employee => "Employee",
    User => "User",
});

/// Urgency of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

string_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

/// Kind of record a notification links to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedEntityType {
    AdvanceBooking,
    Attendance,
    Expense,
    AdvanceSalary,
    Bill,
    Client,
    #[default]
    None,
}

string_enum!(RelatedEntityType {
    AdvanceBooking => "advance_booking",
    Attendance => "attendance",
    Expense => "expense",
    AdvanceSalary => "advance_salary",
    Bill => "bill",
    Client => "client",
    None => "none",
});

/// The recipient-independent content of a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub related_entity_type: RelatedEntityType,
    #[serde(default)]
    pub related_entity_id: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl NotificationPayload {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            notification_type,
            priority: Priority::default(),
            related_entity_type: RelatedEntityType::None,
            related_entity_id: None,
            scheduled_for: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn related_to(mut self, entity_type: RelatedEntityType, id: impl Into<String>) -> Self {
        self.related_entity_type = entity_type;
        self.related_entity_id = Some(id.into());
        self
    }

    /// Trims title and message and rejects empty ones
    pub fn validate(mut self) -> Result<Self, NotificationError> {
        self.title = self.title.trim().to_string();
        self.message = self.message.trim().to_string();
        if self.title.is_empty() || self.message.is_empty() {
            return Err(NotificationError::validation("Title and message are required"));
        }
        Ok(self)
    }
}

/// A stored notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub recipient_type: RecipientType,
    pub recipient_id: Option<RecipientId>,
    pub recipient_model: RecipientModel,
    pub related_entity_type: RelatedEntityType,
    pub related_entity_id: Option<String>,
    pub priority: Priority,
    pub is_read: bool,
    pub is_active: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Builds the notification for one resolved recipient
    pub fn for_recipient(payload: &NotificationPayload, role: StaffRole, recipient: Recipient) -> Self {
        Self::build(payload, RecipientType::from(role), Some(recipient.id), recipient.model)
    }

    /// Builds a single notification addressed to an explicit recipient id
    pub fn targeted(
        payload: &NotificationPayload,
        recipient_type: RecipientType,
        recipient_id: RecipientId,
    ) -> Self {
        let model = match recipient_type {
            RecipientType::Admin => RecipientModel::Admin,
            RecipientType::Manager | RecipientType::Both => RecipientModel::Manager,
        };
        Self::build(payload, recipient_type, Some(recipient_id), model)
    }

    fn build(
        payload: &NotificationPayload,
        recipient_type: RecipientType,
        recipient_id: Option<RecipientId>,
        recipient_model: RecipientModel,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NotificationId::new_v7(),
            title: payload.title.clone(),
            message: payload.message.clone(),
            notification_type: payload.notification_type,
            recipient_type,
            recipient_id,
            recipient_model,
            related_entity_type: payload.related_entity_type,
            related_entity_id: payload.related_entity_id.clone(),
            priority: payload.priority,
            is_read: false,
            is_active: true,
            scheduled_for: payload.scheduled_for,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Addressed to the viewer directly, or a role-wide broadcast covering
    /// the viewer's role
    pub fn is_addressed_to(&self, viewer: &Viewer) -> bool {
        match self.recipient_id {
            Some(id) => id == viewer.id,
            None => viewer
                .role
                .map(|role| self.recipient_type.includes(role))
                .unwrap_or(false),
        }
    }

    /// Unscheduled, already sent, or scheduled at or before `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.sent_at.is_some() || self.scheduled_for.map_or(true, |at| at <= now)
    }

    /// Active, due and addressed to the viewer
    pub fn is_visible_to(&self, viewer: &Viewer, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_due(now) && self.is_addressed_to(viewer)
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}
