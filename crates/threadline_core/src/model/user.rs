//! Public user profile.
//!
//! Identity is issued by the authentication collaborator; this crate only
//! stores the display profile used to decorate comments and notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier supplied by the authentication collaborator.
pub type UserId = Uuid;

/// Author profile joined into read models. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl UserProfile {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}
