//! Comment lifecycle service.
//!
//! # Responsibility
//! - Create comments and replies, and emit reply notifications.
//! - Enforce the mutability window for edit, delete, and recover.
//! - Choose between soft delete and hard delete for one delete intent.
//!
//! # Invariants
//! - Ownership is part of the lookup: a comment owned by someone else is
//!   reported exactly like a missing one.
//! - The window is open while `now < editable_until`; every edit moves
//!   `editable_until` to `now + edit_window`. Delete and recover never move it.
//! - A reply is persisted before its notification is attempted, and a failed
//!   notification never fails the reply.
//! - A reply is never stored under a parent that is gone by the time of the
//!   insert; that case reports `NotFound(ParentComment)` like a missing parent.

use crate::clock::{Clock, SystemClock};
use crate::config::ThreadConfig;
use crate::model::comment::{Comment, CommentId, CommentRecord, DeleteOutcome};
use crate::model::notification::Notification;
use crate::model::user::UserId;
use crate::repo::comment_repo::CommentRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::service::error::{NotFoundTarget, ServiceError, ValidationError};
use log::{debug, error, info, warn};

/// Attempts a delete makes before giving up on a record that keeps changing
/// between its window check and its guarded write.
pub const MAX_DELETE_ATTEMPTS: usize = 3;

/// Lifecycle engine over the comment and notification stores.
pub struct CommentService<R, N, C = SystemClock> {
    comments: R,
    notifications: N,
    clock: C,
    config: ThreadConfig,
}

impl<R: CommentRepository, N: NotificationRepository> CommentService<R, N, SystemClock> {
    /// Creates a service with wall-clock time and default tunables.
    pub fn new(comments: R, notifications: N) -> Self {
        Self::with_clock(comments, notifications, SystemClock, ThreadConfig::default())
    }
}

impl<R: CommentRepository, N: NotificationRepository, C: Clock> CommentService<R, N, C> {
    pub fn with_clock(comments: R, notifications: N, clock: C, config: ThreadConfig) -> Self {
        Self {
            comments,
            notifications,
            clock,
            config,
        }
    }

    /// Creates a top-level comment, or a reply when `parent_id` is set.
    ///
    /// # Errors
    /// - `Validation` when `author` is absent or `content` is blank.
    /// - `NotFound(ParentComment)` when `parent_id` does not exist.
    ///
    /// # Side effects
    /// - Replying to another user's comment records one notification for
    ///   that user. Notification failures are logged and swallowed.
    pub fn create_comment(
        &self,
        author: Option<UserId>,
        content: impl Into<String>,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, ServiceError> {
        let result = self.create_comment_inner(author, content.into(), parent_id);
        log_outcome("comment_create", &result);
        result
    }

    fn create_comment_inner(
        &self,
        author: Option<UserId>,
        content: String,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, ServiceError> {
        let author = author.ok_or(ValidationError::MissingAuthor)?;
        let content = require_content(content)?;

        let parent = match parent_id {
            Some(parent_id) => Some(
                self.comments
                    .get_comment(parent_id)?
                    .ok_or(ServiceError::NotFound(NotFoundTarget::ParentComment(
                        parent_id,
                    )))?
                    .comment,
            ),
            None => None,
        };

        let now = self.clock.now_ms();
        let comment = Comment::new(
            author,
            content,
            parent_id,
            now,
            self.config.deadline_from(now),
        );
        let inserted = self.comments.create_comment(&comment)?;
        // Parent was hard-deleted between the lookup above and the insert.
        if let (false, Some(parent_id)) = (inserted, comment.parent_id) {
            return Err(ServiceError::NotFound(NotFoundTarget::ParentComment(
                parent_id,
            )));
        }
        info!(
            "event=comment_create module=service status=ok comment_id={} is_reply={}",
            comment.id,
            parent.is_some()
        );

        if let Some(parent) = parent {
            if parent.user_id != author {
                self.notify_parent_author(&parent, &comment, now);
            }
        }

        Ok(comment)
    }

    fn notify_parent_author(&self, parent: &Comment, reply: &Comment, now: i64) {
        let notification = Notification::for_reply(parent.user_id, reply, now);
        match self.notifications.create_notification(&notification) {
            Ok(()) => info!(
                "event=notification_create module=service status=ok notification_id={} comment_id={}",
                notification.id, reply.id
            ),
            Err(err) => warn!(
                "event=notification_create module=service status=error error_code=notification_insert_failed comment_id={} error={}",
                reply.id, err
            ),
        }
    }

    /// Loads one comment with its author profile.
    pub fn get_comment(&self, id: CommentId) -> Result<CommentRecord, ServiceError> {
        self.comments
            .get_comment(id)?
            .ok_or(ServiceError::NotFound(NotFoundTarget::Comment(id)))
    }

    /// Replaces content while the window is open and restarts the window.
    ///
    /// # Errors
    /// - `Unauthenticated` when `requester` is absent.
    /// - `Validation` when `content` is blank.
    /// - `NotFound` when the comment is missing or owned by someone else.
    /// - `EditWindowExpired` when `now >= editable_until`.
    pub fn edit_comment(
        &self,
        requester: Option<UserId>,
        id: CommentId,
        content: impl Into<String>,
    ) -> Result<Comment, ServiceError> {
        let result = self.edit_comment_inner(requester, id, content.into());
        log_outcome("comment_edit", &result);
        result
    }

    fn edit_comment_inner(
        &self,
        requester: Option<UserId>,
        id: CommentId,
        content: String,
    ) -> Result<Comment, ServiceError> {
        let owner = requester.ok_or(ServiceError::Unauthenticated)?;
        let content = require_content(content)?;

        let comment = self.load_owned(id, owner)?;
        let now = self.clock.now_ms();
        ensure_editable(&comment, now)?;

        let deadline = self.config.deadline_from(now);
        if !self
            .comments
            .update_content_if_editable(id, owner, &content, now, deadline)?
        {
            return Err(self.classify_guard_miss(id, owner, now));
        }
        self.load_owned(id, owner)
    }

    /// Deletes a comment: soft while the window is open, hard afterwards.
    ///
    /// Hard delete leaves replies in place with a dangling `parent_id`; the
    /// tree assembler never reaches them again.
    pub fn delete_comment(
        &self,
        requester: Option<UserId>,
        id: CommentId,
    ) -> Result<DeleteOutcome, ServiceError> {
        let result = self.delete_comment_inner(requester, id);
        log_outcome("comment_delete", &result);
        result
    }

    fn delete_comment_inner(
        &self,
        requester: Option<UserId>,
        id: CommentId,
    ) -> Result<DeleteOutcome, ServiceError> {
        let owner = requester.ok_or(ServiceError::Unauthenticated)?;

        for attempt in 1..=MAX_DELETE_ATTEMPTS {
            let comment = self.load_owned(id, owner)?;
            let now = self.clock.now_ms();

            if comment.is_editable_at(now) {
                if self.comments.set_deleted_if_editable(id, owner, true, now)? {
                    return Ok(DeleteOutcome::SoftDeleted(self.load_owned(id, owner)?));
                }
            } else if self.comments.hard_delete_if_expired(id, owner, now)? {
                info!("event=comment_hard_delete module=service status=ok comment_id={id}");
                return Ok(DeleteOutcome::HardDeleted(id));
            }

            debug!(
                "event=comment_delete module=service status=retry comment_id={id} attempt={attempt}"
            );
        }

        Err(ServiceError::Contended(id))
    }

    /// Clears the soft-delete flag while the window is open.
    pub fn recover_comment(
        &self,
        requester: Option<UserId>,
        id: CommentId,
    ) -> Result<Comment, ServiceError> {
        let result = self.recover_comment_inner(requester, id);
        log_outcome("comment_recover", &result);
        result
    }

    fn recover_comment_inner(
        &self,
        requester: Option<UserId>,
        id: CommentId,
    ) -> Result<Comment, ServiceError> {
        let owner = requester.ok_or(ServiceError::Unauthenticated)?;
        let comment = self.load_owned(id, owner)?;
        let now = self.clock.now_ms();
        ensure_editable(&comment, now)?;

        if !self.comments.set_deleted_if_editable(id, owner, false, now)? {
            return Err(self.classify_guard_miss(id, owner, now));
        }
        self.load_owned(id, owner)
    }

    fn load_owned(&self, id: CommentId, owner: UserId) -> Result<Comment, ServiceError> {
        self.comments
            .find_owned(id, owner)?
            .ok_or(ServiceError::NotFound(NotFoundTarget::Comment(id)))
    }

    /// Explains why a guarded write matched no row.
    fn classify_guard_miss(&self, id: CommentId, owner: UserId, now: i64) -> ServiceError {
        match self.comments.find_owned(id, owner) {
            Err(err) => err.into(),
            Ok(None) => ServiceError::NotFound(NotFoundTarget::Comment(id)),
            Ok(Some(comment)) => match ensure_editable(&comment, now) {
                Err(err) => err,
                Ok(()) => ServiceError::Contended(id),
            },
        }
    }
}

fn require_content(content: String) -> Result<String, ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(content)
}

fn ensure_editable(comment: &Comment, now: i64) -> Result<(), ServiceError> {
    if comment.is_editable_at(now) {
        return Ok(());
    }
    Err(ServiceError::EditWindowExpired {
        comment_id: comment.id,
        editable_until: comment.editable_until,
    })
}

pub(crate) fn log_outcome<T>(event: &str, result: &Result<T, ServiceError>) {
    let Err(err) = result else {
        return;
    };
    let kind = err.kind();
    if kind.is_caller_fixable() {
        debug!(
            "event={event} module=service status=rejected error_code={}",
            kind.code()
        );
    } else {
        error!(
            "event={event} module=service status=error error_code={} error={err}",
            kind.code()
        );
    }
}
