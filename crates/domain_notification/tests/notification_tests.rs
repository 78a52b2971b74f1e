//! Tests for notification entities and viewer queries

use chrono::{Duration, Utc};
use core_kernel::RecipientId;
use domain_notification::{
    Notification, NotificationPayload, NotificationQuery, NotificationType, Priority,
    Recipient, RecipientModel, RecipientType, RelatedEntityType, StaffRole, Viewer,
};

fn payload() -> NotificationPayload {
    NotificationPayload::new("Bill Generated", "Bill of 1070.00 for Jane", NotificationType::BillGenerated)
        .with_priority(Priority::High)
        .related_to(RelatedEntityType::Bill, "BILL1700000000000")
}

// ============================================================================
// Payload Tests
// ============================================================================

mod payload_tests {
    use super::*;

    #[test]
    fn test_payload_builders() {
        let p = payload();
        assert_eq!(p.priority, Priority::High);
        assert_eq!(p.related_entity_type, RelatedEntityType::Bill);
        assert_eq!(p.related_entity_id.as_deref(), Some("BILL1700000000000"));
    }

    #[test]
    fn test_payload_deserializes_with_defaults() {
        let p: NotificationPayload = serde_json::from_str(
            r#"{"title":"Alert","message":"Disk almost full","type":"system_alert"}"#,
        )
        .unwrap();
        assert_eq!(p.notification_type, NotificationType::SystemAlert);
        assert_eq!(p.priority, Priority::Medium);
        assert_eq!(p.related_entity_type, RelatedEntityType::None);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_str::<NotificationPayload>(
            r#"{"title":"x","message":"y","type":"party"}"#,
        );
        assert!(result.is_err());
    }
}

// ============================================================================
// Query Tests
// ============================================================================

mod query_tests {
    use super::*;

    fn manager_copy(viewer: &Viewer) -> Notification {
        Notification::for_recipient(
            &payload(),
            StaffRole::Manager,
            Recipient::new(viewer.id, RecipientModel::Manager),
        )
    }

    #[test]
    fn test_query_type_filter() {
        let viewer = Viewer::new(RecipientId::new(), Some(StaffRole::Manager));
        let notification = manager_copy(&viewer);

        assert!(NotificationQuery::for_viewer(viewer).matches(&notification));
        assert!(NotificationQuery::for_viewer(viewer)
            .of_type(NotificationType::BillGenerated)
            .matches(&notification));
        assert!(!NotificationQuery::for_viewer(viewer)
            .of_type(NotificationType::ExpenseRequest)
            .matches(&notification));
    }

    #[test]
    fn test_query_read_filter() {
        let viewer = Viewer::new(RecipientId::new(), Some(StaffRole::Manager));
        let mut notification = manager_copy(&viewer);
        notification.mark_read();

        assert!(NotificationQuery::for_viewer(viewer).read_state(true).matches(&notification));
        assert!(!NotificationQuery::for_viewer(viewer).read_state(false).matches(&notification));
    }

    #[test]
    fn test_query_respects_schedule() {
        let viewer = Viewer::new(RecipientId::new(), Some(StaffRole::Manager));
        let mut notification = manager_copy(&viewer);
        notification.scheduled_for = Some(Utc::now() + Duration::days(1));

        assert!(!NotificationQuery::for_viewer(viewer).matches(&notification));
    }

    #[test]
    fn test_admin_does_not_see_manager_copies() {
        let manager = Viewer::new(RecipientId::new(), Some(StaffRole::Manager));
        let admin = Viewer::new(RecipientId::new(), Some(StaffRole::Admin));
        let notification = manager_copy(&manager);

        assert!(!NotificationQuery::for_viewer(admin).matches(&notification));
        assert_eq!(notification.recipient_type, RecipientType::Manager);
    }
}
