//! Repository implementations
//!
//! Each repository owns the SQL for one aggregate and returns row types.
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` rows, so
//! the crate builds without a live database or an offline query cache.

pub mod client;
pub mod bill;
pub mod gst;
pub mod notification;
pub mod staff;

pub use client::{ClientRepository, ClientRow, VisitRow};
pub use bill::{BillFilter, BillRepository, BillRow};
pub use gst::{GstConfigRepository, GstRevisionRow};
pub use notification::{NotificationFilter, NotificationRepository, NotificationRow};
pub use staff::StaffRepository;

/// Turns free text into an `ILIKE` pattern matching it as a substring.
///
/// `%`, `_` and `\` in the input are escaped so they match literally.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
