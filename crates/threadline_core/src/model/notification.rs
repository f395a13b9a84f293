//! Reply notification model.
//!
//! # Invariants
//! - `user_id` is the parent comment's author, never the replier.
//! - Only `is_read` changes after creation.

use crate::model::comment::{Comment, CommentId};
use crate::model::user::{UserId, UserProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable notification identifier.
pub type NotificationId = Uuid;

/// Notification that `comment_id` replied to a comment owned by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Reply that triggered the notification.
    pub comment_id: CommentId,
    pub is_read: bool,
    /// Epoch ms.
    pub created_at: i64,
}

impl Notification {
    /// Builds an unread notification for `reply`, addressed to `recipient`.
    pub fn for_reply(recipient: UserId, reply: &Comment, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: recipient,
            comment_id: reply.id,
            is_read: false,
            created_at: now_ms,
        }
    }
}

/// Notification joined with its triggering reply and that reply's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(flatten)]
    pub notification: Notification,
    /// `None` once the reply has been hard-deleted.
    pub comment: Option<Comment>,
    pub author: Option<UserProfile>,
}
