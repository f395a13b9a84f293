//! Notification use-case service.
//!
//! # Invariants
//! - Callers only ever see or change their own notifications.
//! - `toggle_read` flips; two toggles restore the original state.

use crate::model::notification::{NotificationId, NotificationRecord};
use crate::model::user::UserId;
use crate::repo::notification_repo::NotificationRepository;
use crate::service::comment_service::log_outcome;
use crate::service::error::{NotFoundTarget, ServiceError};

/// Pull-based notification dispatcher.
pub struct NotificationService<N> {
    notifications: N,
}

impl<N: NotificationRepository> NotificationService<N> {
    pub fn new(notifications: N) -> Self {
        Self { notifications }
    }

    /// Lists the caller's notifications, newest first.
    pub fn list_notifications(
        &self,
        requester: Option<UserId>,
    ) -> Result<Vec<NotificationRecord>, ServiceError> {
        let result = requester
            .ok_or(ServiceError::Unauthenticated)
            .and_then(|user| {
                self.notifications
                    .list_for_recipient(user)
                    .map_err(ServiceError::from)
            });
        log_outcome("notification_list", &result);
        result
    }

    /// Flips the read flag and returns its new value.
    ///
    /// # Errors
    /// - `NotFound` when the notification is missing or addressed to
    ///   another user.
    pub fn toggle_read(
        &self,
        requester: Option<UserId>,
        id: NotificationId,
    ) -> Result<bool, ServiceError> {
        let result = requester
            .ok_or(ServiceError::Unauthenticated)
            .and_then(|user| {
                self.notifications
                    .toggle_read(id, user)?
                    .ok_or(ServiceError::NotFound(NotFoundTarget::Notification(id)))
            });
        log_outcome("notification_toggle_read", &result);
        result
    }

    /// Number of unread notifications for the caller.
    pub fn count_unread(&self, requester: Option<UserId>) -> Result<u64, ServiceError> {
        let user = requester.ok_or(ServiceError::Unauthenticated)?;
        Ok(self.notifications.count_unread(user)?)
    }
}
