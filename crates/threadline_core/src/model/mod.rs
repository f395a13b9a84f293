//! Domain model for threaded comments and reply notifications.
//!
//! # Responsibility
//! - Define canonical records owned by the stores.
//! - Define read projections returned by services.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Comment deletion inside the mutability window is a reversible flag;
//!   after the window it is a permanent removal.

pub mod comment;
pub mod notification;
pub mod user;
