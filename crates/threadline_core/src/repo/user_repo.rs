//! User profile repository.
//!
//! Stores the public profile only; credentials live with the
//! authentication collaborator.

use crate::model::user::{UserId, UserProfile};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for user profiles.
pub trait UserRepository {
    /// Inserts or refreshes a profile keyed by id.
    fn upsert_user(&self, profile: &UserProfile) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserProfile>>;
}

/// SQLite-backed user profile repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "users", &["id", "name", "email", "created_at"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn upsert_user(&self, profile: &UserProfile) -> RepoResult<()> {
        if profile.email.trim().is_empty() {
            return Err(RepoError::InvalidData(format!(
                "user {} has an empty email",
                profile.id
            )));
        }
        self.conn.execute(
            "INSERT INTO users (id, name, email)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email;",
            params![profile.id.to_string(), profile.name, profile.email],
        )?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserProfile>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(id_text, name, email)| {
            Ok(UserProfile {
                id: parse_uuid(&id_text, "users.id")?,
                name,
                email,
            })
        })
        .transpose()
    }
}
