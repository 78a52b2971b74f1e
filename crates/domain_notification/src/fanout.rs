//! Notification fan-out and viewer operations

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use core_kernel::{NotificationId, Page, PageRequest, RecipientId};

use crate::error::NotificationError;
use crate::notification::{Notification, NotificationPayload, RecipientModel, RecipientType};
use crate::ports::{NotificationPort, NotificationQuery, RecipientDirectory};
use crate::recipient::{Recipient, StaffRole, Viewer};

/// Request to create a notification
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub payload: NotificationPayload,
    pub recipient_type: RecipientType,
    /// When set, exactly one targeted notification is created instead of a
    /// broadcast
    pub recipient_id: Option<RecipientId>,
}

/// What `create_notification` delivered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delivery {
    Broadcast { admins: bool, managers: bool },
    Targeted { notification: Box<Notification> },
}

/// A page of a viewer's feed plus their unread count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub page: Page<Notification>,
    pub unread_count: u64,
}

/// Creates notifications and serves them back to staff
pub struct NotificationFanout {
    store: Arc<dyn NotificationPort>,
    directory: Arc<dyn RecipientDirectory>,
}

impl NotificationFanout {
    pub fn new(store: Arc<dyn NotificationPort>, directory: Arc<dyn RecipientDirectory>) -> Self {
        Self { store, directory }
    }

    /// Sends one notification to every admin. Never fails; returns whether
    /// any notification was written.
    pub async fn notify_all_admins(&self, payload: &NotificationPayload) -> bool {
        self.notify_role(StaffRole::Admin, payload).await
    }

    /// Sends one notification to every manager. Never fails; returns whether
    /// any notification was written.
    pub async fn notify_all_managers(&self, payload: &NotificationPayload) -> bool {
        self.notify_role(StaffRole::Manager, payload).await
    }

    /// Notifies admins and managers concurrently, returning `(admins, managers)`
    pub async fn notify_admins_and_managers(&self, payload: &NotificationPayload) -> (bool, bool) {
        tokio::join!(self.notify_all_admins(payload), self.notify_all_managers(payload))
    }

    async fn notify_role(&self, role: StaffRole, payload: &NotificationPayload) -> bool {
        match self.try_notify_role(role, payload).await {
            Ok(0) => {
                warn!(role = %role, title = %payload.title, "No recipients found for notification");
                false
            }
            Ok(count) => {
                info!(role = %role, count, title = %payload.title, "Notifications created");
                true
            }
            Err(e) => {
                error!(role = %role, title = %payload.title, error = %e, "Failed to create notifications");
                false
            }
        }
    }

    async fn try_notify_role(&self, role: StaffRole, payload: &NotificationPayload) -> Result<usize, NotificationError> {
        let recipients = self.resolve_recipients(role).await?;
        if recipients.is_empty() {
            return Ok(0);
        }

        let notifications = recipients
            .into_iter()
            .map(|recipient| Notification::for_recipient(payload, role, recipient))
            .collect();
        Ok(self.store.insert_many(notifications).await?)
    }

    /// Every admin or manager from both the role accounts and active employees
    pub async fn resolve_recipients(&self, role: StaffRole) -> Result<Vec<Recipient>, NotificationError> {
        let accounts = self.directory.role_accounts(role).await?;
        let employees = self.directory.active_employees(role).await?;
        debug!(role = %role, accounts = accounts.len(), employees = employees.len(), "Resolved recipients");

        let account_model = role.account_model();
        Ok(accounts
            .into_iter()
            .map(|id| Recipient::new(id, account_model))
            .chain(employees.into_iter().map(|id| Recipient::new(id, RecipientModel::Employee)))
            .collect())
    }

    /// Creates a targeted notification, or broadcasts to the recipient type
    /// when no recipient id is given
    pub async fn create_notification(&self, request: CreateNotification) -> Result<Delivery, NotificationError> {
        let payload = request.payload.validate()?;

        if let Some(recipient_id) = request.recipient_id {
            let notification = Notification::targeted(&payload, request.recipient_type, recipient_id);
            let stored = self.store.insert(notification).await?;
            return Ok(Delivery::Targeted { notification: Box::new(stored) });
        }

        let (admins, managers) = match request.recipient_type {
            RecipientType::Admin => (self.notify_all_admins(&payload).await, false),
            RecipientType::Manager => (false, self.notify_all_managers(&payload).await),
            RecipientType::Both => self.notify_admins_and_managers(&payload).await,
        };

        if !admins && !managers {
            return Err(NotificationError::DeliveryFailed(format!(
                "Failed to send notifications to {}",
                match request.recipient_type {
                    RecipientType::Admin => "admins",
                    RecipientType::Manager => "managers",
                    RecipientType::Both => "admins/managers",
                }
            )));
        }
        Ok(Delivery::Broadcast { admins, managers })
    }

    /// The viewer's feed, newest first, with their unread count
    pub async fn list(&self, query: NotificationQuery, page: PageRequest) -> Result<NotificationFeed, NotificationError> {
        let found = self.store.find(&query, page).await?;
        let unread_count = self.store.count_unread(&query).await?;
        Ok(NotificationFeed { page: found, unread_count })
    }

    /// Unread, due notifications addressed to the viewer
    pub async fn unread_count(&self, viewer: Viewer) -> Result<u64, NotificationError> {
        Ok(self.store.count_unread(&NotificationQuery::for_viewer(viewer)).await?)
    }

    pub async fn mark_as_read(&self, id: NotificationId, viewer: Viewer) -> Result<Notification, NotificationError> {
        self.require_visible(id, &viewer).await?;
        Ok(self.store.mark_read(id).await?)
    }

    pub async fn mark_all_as_read(&self, viewer: Viewer) -> Result<u64, NotificationError> {
        Ok(self.store.mark_all_read(&viewer).await?)
    }

    /// Soft-deletes a notification addressed to the viewer
    pub async fn delete(&self, id: NotificationId, viewer: Viewer) -> Result<(), NotificationError> {
        self.require_visible(id, &viewer).await?;
        Ok(self.store.deactivate(id).await?)
    }

    async fn require_visible(&self, id: NotificationId, viewer: &Viewer) -> Result<Notification, NotificationError> {
        self.store
            .find_for_viewer(id, viewer)
            .await?
            .ok_or_else(|| NotificationError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationType;
    use crate::ports::mock::{MockNotificationPort, MockRecipientDirectory};

    fn payload() -> NotificationPayload {
        NotificationPayload::new("Bill Generated", "A bill was generated", NotificationType::BillGenerated)
    }

    async fn setup() -> (NotificationFanout, Arc<MockNotificationPort>, Arc<MockRecipientDirectory>) {
        let store = Arc::new(MockNotificationPort::new());
        let directory = Arc::new(MockRecipientDirectory::new());
        let fanout = NotificationFanout::new(store.clone(), directory.clone());
        (fanout, store, directory)
    }

    #[tokio::test]
    async fn test_admins_resolved_from_both_stores() {
        let (fanout, store, directory) = setup().await;
        let account = directory.add_account(StaffRole::Admin).await;
        let employee = directory.add_employee(StaffRole::Admin, true).await;
        directory.add_employee(StaffRole::Admin, false).await;
        directory.add_employee(StaffRole::Manager, true).await;

        assert!(fanout.notify_all_admins(&payload()).await);

        let written = store.all().await;
        assert_eq!(written.len(), 2);
        let by_id = |id| written.iter().find(|n| n.recipient_id == Some(id)).unwrap();
        assert_eq!(by_id(account).recipient_model, RecipientModel::Admin);
        assert_eq!(by_id(employee).recipient_model, RecipientModel::Employee);
        assert!(written.iter().all(|n| n.recipient_type == RecipientType::Admin));
    }

    #[tokio::test]
    async fn test_no_recipients_returns_false() {
        let (fanout, store, _) = setup().await;
        assert!(!fanout.notify_all_managers(&payload()).await);
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let (fanout, store, directory) = setup().await;
        directory.add_account(StaffRole::Manager).await;
        store.set_failing(true);
        assert!(!fanout.notify_all_managers(&payload()).await);
    }

    #[tokio::test]
    async fn test_both_broadcast_reaches_admins_and_managers() {
        let (fanout, store, directory) = setup().await;
        directory.add_account(StaffRole::Admin).await;
        directory.add_account(StaffRole::Manager).await;
        directory.add_employee(StaffRole::Manager, true).await;

        let delivery = fanout
            .create_notification(CreateNotification {
                payload: payload(),
                recipient_type: RecipientType::Both,
                recipient_id: None,
            })
            .await
            .unwrap();

        assert_eq!(delivery, Delivery::Broadcast { admins: true, managers: true });
        assert_eq!(store.all().await.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_broadcast_still_succeeds() {
        let (fanout, _, directory) = setup().await;
        directory.add_account(StaffRole::Manager).await;

        let delivery = fanout
            .create_notification(CreateNotification {
                payload: payload(),
                recipient_type: RecipientType::Both,
                recipient_id: None,
            })
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Broadcast { admins: false, managers: true });
    }

    #[tokio::test]
    async fn test_broadcast_to_nobody_fails() {
        let (fanout, _, _) = setup().await;
        let result = fanout
            .create_notification(CreateNotification {
                payload: payload(),
                recipient_type: RecipientType::Admin,
                recipient_id: None,
            })
            .await;
        assert!(matches!(result, Err(NotificationError::DeliveryFailed(_))));
    }

    #[tokio::test]
    async fn test_targeted_creates_exactly_one() {
        let (fanout, store, directory) = setup().await;
        directory.add_account(StaffRole::Admin).await;
        let target = RecipientId::new();

        let delivery = fanout
            .create_notification(CreateNotification {
                payload: payload(),
                recipient_type: RecipientType::Admin,
                recipient_id: Some(target),
            })
            .await
            .unwrap();

        match delivery {
            Delivery::Targeted { notification } => {
                assert_eq!(notification.recipient_id, Some(target));
                assert_eq!(notification.recipient_model, RecipientModel::Admin);
            }
            other => panic!("expected targeted delivery, got {:?}", other),
        }
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let (fanout, _, _) = setup().await;
        let result = fanout
            .create_notification(CreateNotification {
                payload: NotificationPayload::new("", "body", NotificationType::General),
                recipient_type: RecipientType::Admin,
                recipient_id: Some(RecipientId::new()),
            })
            .await;
        assert!(matches!(result, Err(NotificationError::Validation(_))));
    }

    #[tokio::test]
    async fn test_read_and_delete_lifecycle() {
        let (fanout, _, directory) = setup().await;
        let manager = directory.add_account(StaffRole::Manager).await;
        directory.add_account(StaffRole::Manager).await;
        fanout.notify_all_managers(&payload()).await;
        fanout.notify_all_managers(&payload()).await;

        let viewer = Viewer::new(manager, Some(StaffRole::Manager));
        let feed = fanout
            .list(NotificationQuery::for_viewer(viewer), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(feed.page.total, 2);
        assert_eq!(feed.unread_count, 2);

        let first = feed.page.items[0].id;
        let read = fanout.mark_as_read(first, viewer).await.unwrap();
        assert!(read.is_read);
        assert_eq!(fanout.unread_count(viewer).await.unwrap(), 1);

        assert_eq!(fanout.mark_all_as_read(viewer).await.unwrap(), 1);
        assert_eq!(fanout.unread_count(viewer).await.unwrap(), 0);

        fanout.delete(first, viewer).await.unwrap();
        let feed = fanout
            .list(NotificationQuery::for_viewer(viewer), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(feed.page.total, 1);
        assert!(matches!(
            fanout.delete(first, viewer).await,
            Err(NotificationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cannot_touch_someone_elses_notification() {
        let (fanout, store, directory) = setup().await;
        directory.add_account(StaffRole::Admin).await;
        fanout.notify_all_admins(&payload()).await;
        let id = store.all().await[0].id;

        let stranger = Viewer::new(RecipientId::new(), Some(StaffRole::Admin));
        assert!(matches!(
            fanout.mark_as_read(id, stranger).await,
            Err(NotificationError::NotFound(_))
        ));
    }
}
