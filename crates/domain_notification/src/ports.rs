//! Notification Domain Ports
//!
//! Two ports back the notification domain:
//!
//! - [`NotificationPort`] stores notifications and answers viewer queries.
//! - [`RecipientDirectory`] resolves the staff who receive role broadcasts.
//!
//! Both are implemented by Postgres adapters in `infra_db` and by the
//! in-memory mocks below.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{DomainPort, NotificationId, Page, PageRequest, PortError, RecipientId};

use crate::notification::{Notification, NotificationType};
use crate::recipient::{StaffRole, Viewer};

/// Filter for a viewer's notification feed
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub viewer: Viewer,
    pub notification_type: Option<NotificationType>,
    pub is_read: Option<bool>,
    /// Reference time for scheduled notifications
    pub now: DateTime<Utc>,
}

impl NotificationQuery {
    pub fn for_viewer(viewer: Viewer) -> Self {
        Self {
            viewer,
            notification_type: None,
            is_read: None,
            now: Utc::now(),
        }
    }

    pub fn of_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = Some(notification_type);
        self
    }

    pub fn read_state(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    /// Whether a notification passes every filter of this query
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.is_visible_to(&self.viewer, self.now)
            && self
                .notification_type
                .map_or(true, |t| notification.notification_type == t)
            && self.is_read.map_or(true, |r| notification.is_read == r)
    }
}

/// Storage for notifications
#[async_trait]
pub trait NotificationPort: DomainPort {
    /// Inserts a batch of notifications, returning how many were written
    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<usize, PortError>;

    /// Inserts one notification
    async fn insert(&self, notification: Notification) -> Result<Notification, PortError>;

    /// Notifications matching the query, newest first
    async fn find(&self, query: &NotificationQuery, page: PageRequest) -> Result<Page<Notification>, PortError>;

    /// Number of unread notifications matching the query, ignoring its
    /// `is_read` filter
    async fn count_unread(&self, query: &NotificationQuery) -> Result<u64, PortError>;

    /// An active notification addressed to the viewer, if any
    async fn find_for_viewer(
        &self,
        id: NotificationId,
        viewer: &Viewer,
    ) -> Result<Option<Notification>, PortError>;

    /// Sets `is_read` on one notification
    async fn mark_read(&self, id: NotificationId) -> Result<Notification, PortError>;

    /// Marks every active unread notification addressed to the viewer as read
    async fn mark_all_read(&self, viewer: &Viewer) -> Result<u64, PortError>;

    /// Soft-deletes a notification
    async fn deactivate(&self, id: NotificationId) -> Result<(), PortError>;
}

/// Directory of staff who receive role broadcasts
#[async_trait]
pub trait RecipientDirectory: DomainPort {
    /// Dedicated accounts for the role (admin or manager logins)
    async fn role_accounts(&self, role: StaffRole) -> Result<Vec<RecipientId>, PortError>;

    /// Active employees whose role is `role`
    async fn active_employees(&self, role: StaffRole) -> Result<Vec<RecipientId>, PortError>;
}

/// In-memory mocks of the notification ports
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory notification store
    #[derive(Debug, Default)]
    pub struct MockNotificationPort {
        notifications: Arc<RwLock<HashMap<NotificationId, Notification>>>,
        failing: AtomicBool,
    }

    impl MockNotificationPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent write fail with a connection error
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// All stored notifications, oldest first
        pub async fn all(&self) -> Vec<Notification> {
            let mut all: Vec<_> = self.notifications.read().await.values().cloned().collect();
            all.sort_by_key(|n| (n.created_at, n.id));
            all
        }

        fn check_writable(&self) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("notification store unavailable"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockNotificationPort {}

    #[async_trait]
    impl NotificationPort for MockNotificationPort {
        async fn insert_many(&self, notifications: Vec<Notification>) -> Result<usize, PortError> {
            self.check_writable()?;
            let count = notifications.len();
            let mut store = self.notifications.write().await;
            for notification in notifications {
                store.insert(notification.id, notification);
            }
            Ok(count)
        }

        async fn insert(&self, notification: Notification) -> Result<Notification, PortError> {
            self.check_writable()?;
            self.notifications
                .write()
                .await
                .insert(notification.id, notification.clone());
            Ok(notification)
        }

        async fn find(&self, query: &NotificationQuery, page: PageRequest) -> Result<Page<Notification>, PortError> {
            let store = self.notifications.read().await;
            let mut matching: Vec<_> = store.values().filter(|n| query.matches(n)).cloned().collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(Page::from_vec(matching, page))
        }

        async fn count_unread(&self, query: &NotificationQuery) -> Result<u64, PortError> {
            let unread = query.clone().read_state(false);
            let store = self.notifications.read().await;
            Ok(store.values().filter(|n| unread.matches(n)).count() as u64)
        }

        async fn find_for_viewer(
            &self,
            id: NotificationId,
            viewer: &Viewer,
        ) -> Result<Option<Notification>, PortError> {
            Ok(self
                .notifications
                .read()
                .await
                .get(&id)
                .filter(|n| n.is_active && n.is_addressed_to(viewer))
                .cloned())
        }

        async fn mark_read(&self, id: NotificationId) -> Result<Notification, PortError> {
            self.check_writable()?;
            let mut store = self.notifications.write().await;
            let notification = store
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Notification", id))?;
            notification.mark_read();
            Ok(notification.clone())
        }

        async fn mark_all_read(&self, viewer: &Viewer) -> Result<u64, PortError> {
            self.check_writable()?;
            let mut store = self.notifications.write().await;
            let mut updated = 0;
            for notification in store.values_mut() {
                if notification.is_active && !notification.is_read && notification.is_addressed_to(viewer) {
                    notification.mark_read();
                    updated += 1;
                }
            }
            Ok(updated)
        }

        async fn deactivate(&self, id: NotificationId) -> Result<(), PortError> {
            self.check_writable()?;
            let mut store = self.notifications.write().await;
            let notification = store
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Notification", id))?;
            notification.deactivate();
            Ok(())
        }
    }

    /// In-memory staff directory
    #[derive(Debug, Default)]
    pub struct MockRecipientDirectory {
        accounts: Arc<RwLock<HashMap<StaffRole, Vec<RecipientId>>>>,
        employees: Arc<RwLock<Vec<(RecipientId, StaffRole, bool)>>>,
    }

    impl MockRecipientDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a dedicated role account
        pub async fn add_account(&self, role: StaffRole) -> RecipientId {
            let id = RecipientId::new();
            self.accounts.write().await.entry(role).or_default().push(id);
            id
        }

        /// Registers an employee with a role and an active flag
        pub async fn add_employee(&self, role: StaffRole, is_active: bool) -> RecipientId {
            let id = RecipientId::new();
            self.employees.write().await.push((id, role, is_active));
            id
        }
    }

    impl DomainPort for MockRecipientDirectory {}

    #[async_trait]
    impl RecipientDirectory for MockRecipientDirectory {
        async fn role_accounts(&self, role: StaffRole) -> Result<Vec<RecipientId>, PortError> {
            Ok(self.accounts.read().await.get(&role).cloned().unwrap_or_default())
        }

        async fn active_employees(&self, role: StaffRole) -> Result<Vec<RecipientId>, PortError> {
            Ok(self
                .employees
                .read()
                .await
                .iter()
                .filter(|(_, r, active)| *r == role && *active)
                .map(|(id, _, _)| *id)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use crate::notification::{NotificationPayload, RecipientType};

    fn notification_for(viewer: &Viewer) -> Notification {
        Notification::targeted(
            &NotificationPayload::new("Hello", "World", NotificationType::General),
            RecipientType::Manager,
            viewer.id,
        )
    }

    #[tokio::test]
    async fn test_mock_find_filters_and_counts() {
        let port = MockNotificationPort::new();
        let viewer = Viewer::new(RecipientId::new(), Some(StaffRole::Manager));
        let stranger = Viewer::new(RecipientId::new(), Some(StaffRole::Manager));

        let mut read = notification_for(&viewer);
        read.is_read = true;
        port.insert_many(vec![notification_for(&viewer), read, notification_for(&stranger)])
            .await
            .unwrap();

        let query = NotificationQuery::for_viewer(viewer);
        let page = port.find(&query, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(port.count_unread(&query).await.unwrap(), 1);

        let unread_only = query.clone().read_state(false);
        assert_eq!(port.find(&unread_only, PageRequest::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_mock_failing_store_rejects_writes() {
        let port = MockNotificationPort::new();
        port.set_failing(true);
        let viewer = Viewer::new(RecipientId::new(), None);
        let result = port.insert(notification_for(&viewer)).await;
        assert!(result.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_mock_directory_filters_inactive_employees() {
        let directory = MockRecipientDirectory::new();
        let active = directory.add_employee(StaffRole::Admin, true).await;
        directory.add_employee(StaffRole::Admin, false).await;
        directory.add_employee(StaffRole::Manager, true).await;

        assert_eq!(directory.active_employees(StaffRole::Admin).await.unwrap(), vec![active]);
        assert!(directory.role_accounts(StaffRole::Admin).await.unwrap().is_empty());
    }
}
