//! Comment domain model.
//!
//! # Responsibility
//! - Define the canonical comment record and its read projections.
//! - Provide mutability-window and visibility helpers.
//!
//! # Invariants
//! - `id`, `user_id`, and `parent_id` never change after creation.
//! - `content` is never blank.
//! - `editable_until` is never earlier than `created_at`.
//! - A comment is never its own parent.

use crate::model::user::{UserId, UserProfile};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable comment identifier.
pub type CommentId = Uuid;

/// Canonical comment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    /// Authoring user.
    pub user_id: UserId,
    /// `None` for top-level comments.
    pub parent_id: Option<CommentId>,
    /// Soft-delete marker, reversible while the window is open.
    pub is_deleted: bool,
    /// Epoch ms deadline of the mutability window.
    pub editable_until: i64,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms of the last successful edit.
    pub updated_at: i64,
}

/// Comment validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    BlankContent,
    DeadlineBeforeCreation {
        editable_until: i64,
        created_at: i64,
    },
    SelfParent(CommentId),
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankContent => write!(f, "comment content must not be blank"),
            Self::DeadlineBeforeCreation {
                editable_until,
                created_at,
            } => write!(
                f,
                "editable_until ({editable_until}) must not be earlier than created_at ({created_at})"
            ),
            Self::SelfParent(id) => write!(f, "comment {id} cannot be its own parent"),
        }
    }
}

impl Error for CommentValidationError {}

impl Comment {
    /// Creates a comment at `now_ms` whose window closes at `editable_until`.
    pub fn new(
        user_id: UserId,
        content: impl Into<String>,
        parent_id: Option<CommentId>,
        now_ms: i64,
        editable_until: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            user_id,
            parent_id,
            is_deleted: false,
            editable_until,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Validates record-level invariants before persistence and after reads.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        if self.content.trim().is_empty() {
            return Err(CommentValidationError::BlankContent);
        }
        if self.editable_until < self.created_at {
            return Err(CommentValidationError::DeadlineBeforeCreation {
                editable_until: self.editable_until,
                created_at: self.created_at,
            });
        }
        if self.parent_id == Some(self.id) {
            return Err(CommentValidationError::SelfParent(self.id));
        }
        Ok(())
    }

    /// Whether the owner may still edit, soft-delete, or recover.
    pub fn is_editable_at(&self, now_ms: i64) -> bool {
        now_ms < self.editable_until
    }

    /// Presentation rule: a soft-deleted comment is shown only to its owner,
    /// and only while the window is open.
    pub fn is_visible_to(&self, viewer: Option<UserId>, now_ms: i64) -> bool {
        if !self.is_deleted {
            return true;
        }
        viewer == Some(self.user_id) && self.is_editable_at(now_ms)
    }
}

/// Comment joined with its author's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(flatten)]
    pub comment: Comment,
    /// `None` when no profile row exists for the author.
    pub author: Option<UserProfile>,
}

/// One node of an assembled reply tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub record: CommentRecord,
    /// Direct replies, oldest first.
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> CommentId {
        self.record.comment.id
    }

    /// Drops replies hidden from `viewer`; a hidden reply hides its subtree.
    pub fn retain_visible(&mut self, viewer: Option<UserId>, now_ms: i64) {
        self.replies
            .retain(|reply| reply.record.comment.is_visible_to(viewer, now_ms));
        for reply in &mut self.replies {
            reply.retain_visible(viewer, now_ms);
        }
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.replies
            .iter()
            .map(|reply| 1 + reply.descendant_count())
            .sum()
    }
}

/// Page envelope produced by the tree assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPage {
    /// 1-based page number actually served.
    pub page: u32,
    pub page_size: u32,
    /// Top-level comments, newest first. Empty past the last page.
    pub comments: Vec<CommentNode>,
}

impl CommentPage {
    /// Prunes hidden comments at every depth, including the top level.
    pub fn retain_visible(&mut self, viewer: Option<UserId>, now_ms: i64) {
        self.comments
            .retain(|node| node.record.comment.is_visible_to(viewer, now_ms));
        for node in &mut self.comments {
            node.retain_visible(viewer, now_ms);
        }
    }

    pub fn is_end(&self) -> bool {
        self.comments.is_empty()
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Window still open: the record is flagged and can be recovered.
    SoftDeleted(Comment),
    /// Window lapsed: the record is gone.
    HardDeleted(CommentId),
}
