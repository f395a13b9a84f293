//! Service error taxonomy.
//!
//! Caller-fixable kinds (`Validation`, `Unauthenticated`, `Forbidden`,
//! `NotFound`) are surfaced as-is and never retried. Everything else is an
//! infrastructure failure that transports report generically.

use crate::model::comment::CommentId;
use crate::model::notification::NotificationId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Missing or empty required input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyContent,
    MissingAuthor,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "comment content must not be empty"),
            Self::MissingAuthor => write!(f, "comment author is required"),
        }
    }
}

/// What a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundTarget {
    /// Comment absent or not owned by the requester.
    Comment(CommentId),
    /// Parent named by a reply does not exist.
    ParentComment(CommentId),
    /// Notification absent or addressed to someone else.
    Notification(NotificationId),
}

/// Transport-agnostic error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Infrastructure,
}

impl ErrorKind {
    /// Stable code used in log lines and by transport adapters.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Infrastructure => "infrastructure",
        }
    }

    pub fn is_caller_fixable(self) -> bool {
        !matches!(self, Self::Infrastructure)
    }
}

/// Error returned by comment and notification services.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    /// No caller identity was supplied.
    Unauthenticated,
    /// The mutability window closed at `editable_until`.
    EditWindowExpired {
        comment_id: CommentId,
        editable_until: i64,
    },
    NotFound(NotFoundTarget),
    /// Guarded writes kept missing because of concurrent changes.
    Contended(CommentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::EditWindowExpired { .. } => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Contended(_) | Self::Repo(_) => ErrorKind::Infrastructure,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthenticated => write!(f, "caller is not authenticated"),
            Self::EditWindowExpired {
                comment_id,
                editable_until,
            } => write!(
                f,
                "comment {comment_id} is not editable anymore (window closed at {editable_until})"
            ),
            Self::NotFound(NotFoundTarget::Comment(id)) => {
                write!(f, "comment not found: {id}")
            }
            Self::NotFound(NotFoundTarget::ParentComment(id)) => {
                write!(f, "parent comment not found: {id}")
            }
            Self::NotFound(NotFoundTarget::Notification(id)) => {
                write!(f, "notification not found: {id}")
            }
            Self::Contended(id) => write!(f, "comment {id} kept changing; giving up"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
