//! Notification Domain
//!
//! Staff notifications and the fan-out that turns one logical event into one
//! notification row per admin or manager.
//!
//! # Recipients
//!
//! Each staff role is resolved from two stores: the dedicated role accounts
//! (admin or manager logins) and active employees carrying that role. Every
//! notification created by the fan-out records which store its recipient came
//! from in `recipient_model`, so later lookups resolve the right reference.
//!
//! # Failure policy
//!
//! [`NotificationFanout::notify_all_admins`] and
//! [`NotificationFanout::notify_all_managers`] return `bool` and never error.
//! Other domains call them as best-effort side effects.

pub mod notification;
pub mod recipient;
pub mod error;
pub mod ports;
pub mod fanout;

pub use notification::{
    Notification, NotificationPayload, NotificationType, Priority,
    RecipientModel, RecipientType, RelatedEntityType,
};
pub use recipient::{Recipient, StaffRole, Viewer};
pub use error::NotificationError;
pub use ports::{NotificationPort, NotificationQuery, RecipientDirectory};
pub use fanout::{CreateNotification, Delivery, NotificationFanout, NotificationFeed};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockNotificationPort, MockRecipientDirectory};
