//! Core domain logic for Threadline threaded comments.
//! This crate is the single source of truth for comment lifecycle rules.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ThreadConfig, DEFAULT_EDIT_WINDOW_MS, DEFAULT_PAGE_SIZE};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::comment::{
    Comment, CommentId, CommentNode, CommentPage, CommentRecord, CommentValidationError,
    DeleteOutcome,
};
pub use model::notification::{Notification, NotificationId, NotificationRecord};
pub use model::user::{UserId, UserProfile};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::comment_service::{CommentService, MAX_DELETE_ATTEMPTS};
pub use service::error::{ErrorKind, NotFoundTarget, ServiceError, ValidationError};
pub use service::notification_service::NotificationService;
pub use service::thread_service::{build_comment_tree, ThreadService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
