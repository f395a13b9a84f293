//! Notification repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Recipient listing is `created_at DESC, rowid DESC`.
//! - Read-state flips happen in one statement scoped by id and recipient.
//! - Rows are never deleted here.

use crate::model::notification::{Notification, NotificationId, NotificationRecord};
use crate::model::user::UserId;
use crate::repo::comment_repo::{parse_author_columns, parse_comment_columns};
use crate::repo::{bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTIFICATION_RECORD_SELECT_SQL: &str = "SELECT
    n.id AS id,
    n.user_id AS user_id,
    n.comment_id AS comment_id,
    n.is_read AS is_read,
    n.created_at AS created_at,
    c.id AS c_id,
    c.content AS c_content,
    c.user_id AS c_user_id,
    c.parent_id AS c_parent_id,
    c.is_deleted AS c_is_deleted,
    c.editable_until AS c_editable_until,
    c.created_at AS c_created_at,
    c.updated_at AS c_updated_at,
    u.id AS author_id,
    u.name AS author_name,
    u.email AS author_email
FROM notifications n
LEFT JOIN comments c ON c.id = n.comment_id
LEFT JOIN users u ON u.id = c.user_id";

/// Repository interface for the notification store.
pub trait NotificationRepository {
    fn create_notification(&self, notification: &Notification) -> RepoResult<()>;
    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    /// All notifications for `recipient`, newest first, joined with reply and author.
    fn list_for_recipient(&self, recipient: UserId) -> RepoResult<Vec<NotificationRecord>>;
    /// Flips `is_read` and returns the new value, or `None` when no row
    /// matches both `id` and `recipient`.
    fn toggle_read(&self, id: NotificationId, recipient: UserId) -> RepoResult<Option<bool>>;
    fn count_unread(&self, recipient: UserId) -> RepoResult<u64>;
}

impl<T: NotificationRepository + ?Sized> NotificationRepository for &T {
    fn create_notification(&self, notification: &Notification) -> RepoResult<()> {
        (**self).create_notification(notification)
    }

    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        (**self).get_notification(id)
    }

    fn list_for_recipient(&self, recipient: UserId) -> RepoResult<Vec<NotificationRecord>> {
        (**self).list_for_recipient(recipient)
    }

    fn toggle_read(&self, id: NotificationId, recipient: UserId) -> RepoResult<Option<bool>> {
        (**self).toggle_read(id, recipient)
    }

    fn count_unread(&self, recipient: UserId) -> RepoResult<u64> {
        (**self).count_unread(recipient)
    }
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "notifications",
            &["id", "user_id", "comment_id", "is_read", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create_notification(&self, notification: &Notification) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notifications (id, user_id, comment_id, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                notification.id.to_string(),
                notification.user_id.to_string(),
                notification.comment_id.to_string(),
                bool_to_int(notification.is_read),
                notification.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, comment_id, is_read, created_at
             FROM notifications
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_columns(row)?));
        }
        Ok(None)
    }

    fn list_for_recipient(&self, recipient: UserId) -> RepoResult<Vec<NotificationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_RECORD_SELECT_SQL}
             WHERE n.user_id = ?1
             ORDER BY n.created_at DESC, n.rowid DESC;"
        ))?;
        let mut rows = stmt.query([recipient.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_notification_record_row(row)?);
        }
        Ok(records)
    }

    fn toggle_read(&self, id: NotificationId, recipient: UserId) -> RepoResult<Option<bool>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "UPDATE notifications
                 SET is_read = 1 - is_read
                 WHERE id = ?1
                   AND user_id = ?2
                 RETURNING is_read;",
                params![id.to_string(), recipient.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|flag| parse_flag(flag, "notifications.is_read"))
            .transpose()
    }

    fn count_unread(&self, recipient: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM notifications
             WHERE user_id = ?1
               AND is_read = 0;",
            [recipient.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn parse_notification_columns(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let comment_text: String = row.get("comment_id")?;
    Ok(Notification {
        id: parse_uuid(&id_text, "notifications.id")?,
        user_id: parse_uuid(&user_text, "notifications.user_id")?,
        comment_id: parse_uuid(&comment_text, "notifications.comment_id")?,
        is_read: parse_flag(row.get("is_read")?, "notifications.is_read")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_notification_record_row(row: &Row<'_>) -> RepoResult<NotificationRecord> {
    let notification = parse_notification_columns(row)?;
    let comment = match row.get::<_, Option<String>>("c_id")? {
        Some(_) => Some(parse_comment_columns(row, "c_")?),
        None => None,
    };
    let author = parse_author_columns(row)?;
    Ok(NotificationRecord {
        notification,
        comment,
        author,
    })
}
