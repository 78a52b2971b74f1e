//! Strongly-typed identifiers for domain entities
//!
//! Storage keys are newtype wrappers around UUIDs. The human-facing codes
//! (`BILL...`, `VISIT...`, `CLT001`) are separate string newtypes with their
//! own generation rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(BillId, "BIL");
define_id!(ClientId, "CLI");
define_id!(NotificationId, "NTF");
define_id!(RecipientId, "RCP");
define_id!(StaffId, "STF");

/// Last stamp handed out by [`next_stamp`]
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Returns a millisecond timestamp that is strictly greater than every
/// previous value returned in this process.
///
/// Under a burst of calls within one millisecond the stamp runs ahead of the
/// wall clock by one per call and catches up once the burst ends.
pub fn next_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(if now > last { now } else { last + 1 })
        })
        .unwrap_or(now);
    if now > previous { now } else { previous + 1 }
}

macro_rules! define_code {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a new code from the process-wide monotonic clock
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, next_stamp()))
            }

            /// Returns the code prefix
            pub fn prefix() -> &'static str {
                $prefix
            }

            /// Returns the code as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wraps a stored code without re-validating it
            pub fn from_stored(code: impl Into<String>) -> Self {
                Self(code.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.strip_prefix($prefix) {
                    Some(rest) if !rest.is_empty() => Ok(Self(s.to_string())),
                    _ => Err(CoreError::invalid_identifier(format!(
                        "'{}' is not a {} code",
                        s, $prefix
                    ))),
                }
            }
        }
    };
}

define_code!(BillNumber, "BILL");
define_code!(VisitId, "VISIT");

/// Sequential client code, `CLT` followed by a number padded to at least
/// three digits (`CLT001`, `CLT042`, `CLT1234`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientCode(String);

impl ClientCode {
    const PREFIX: &'static str = "CLT";

    /// Formats a sequence number as a client code
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{}{:03}", Self::PREFIX, sequence))
    }

    /// Returns the numeric part of the code
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = Self(s.to_string());
        match code.sequence() {
            Some(_) => Ok(code),
            None => Err(CoreError::invalid_identifier(format!("'{}' is not a client code", s))),
        }
    }
}
