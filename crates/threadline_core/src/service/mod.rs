//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into comment lifecycle, tree assembly,
//!   and notification use-cases.
//! - Keep transports decoupled from storage details.

pub mod comment_service;
pub mod error;
pub mod notification_service;
pub mod thread_service;
