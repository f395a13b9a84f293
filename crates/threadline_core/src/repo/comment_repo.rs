//! Comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist comments and serve the two bulk reads used for tree assembly.
//! - Apply window-guarded mutations as single conditional statements.
//!
//! # Invariants
//! - Owned lookups match on `id AND user_id`; a foreign comment looks absent.
//! - A reply is only inserted while its parent row exists, checked in the
//!   same statement as the insert.
//! - Top-level listing is `created_at DESC, rowid DESC`.
//! - Reply listing is `created_at ASC, rowid ASC`.

use crate::model::comment::{Comment, CommentId, CommentRecord};
use crate::model::user::{UserId, UserProfile};
use crate::repo::{bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};

const COMMENT_RECORD_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.content AS content,
    c.user_id AS user_id,
    c.parent_id AS parent_id,
    c.is_deleted AS is_deleted,
    c.editable_until AS editable_until,
    c.created_at AS created_at,
    c.updated_at AS updated_at,
    u.id AS author_id,
    u.name AS author_name,
    u.email AS author_email
FROM comments c
LEFT JOIN users u ON u.id = c.user_id";

const COMMENT_COLUMNS: &[&str] = &[
    "id",
    "content",
    "user_id",
    "parent_id",
    "is_deleted",
    "editable_until",
    "created_at",
    "updated_at",
];

/// Repository interface for the comment store.
///
/// The `*_if_*` methods return `false` when their guard did not match, so
/// callers can re-read and classify the miss.
pub trait CommentRepository {
    /// Inserts `comment`. Returns `false` without writing when its
    /// `parent_id` names a comment that no longer exists.
    fn create_comment(&self, comment: &Comment) -> RepoResult<bool>;
    /// Loads one comment with its author, regardless of owner or flag.
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>>;
    /// Loads one comment only if `owner` authored it.
    fn find_owned(&self, id: CommentId, owner: UserId) -> RepoResult<Option<Comment>>;
    /// Replaces content and moves the deadline while `now_ms < editable_until`.
    fn update_content_if_editable(
        &self,
        id: CommentId,
        owner: UserId,
        content: &str,
        now_ms: i64,
        editable_until: i64,
    ) -> RepoResult<bool>;
    /// Sets the soft-delete flag while `now_ms < editable_until`.
    fn set_deleted_if_editable(
        &self,
        id: CommentId,
        owner: UserId,
        is_deleted: bool,
        now_ms: i64,
    ) -> RepoResult<bool>;
    /// Removes the row once `now_ms >= editable_until`. Replies are untouched.
    fn hard_delete_if_expired(&self, id: CommentId, owner: UserId, now_ms: i64)
        -> RepoResult<bool>;
    /// One page of top-level comments, newest first.
    fn list_top_level(&self, limit: u32, offset: u64) -> RepoResult<Vec<CommentRecord>>;
    /// Every reply at every depth, oldest first.
    fn list_replies(&self) -> RepoResult<Vec<CommentRecord>>;
}

impl<T: CommentRepository + ?Sized> CommentRepository for &T {
    fn create_comment(&self, comment: &Comment) -> RepoResult<bool> {
        (**self).create_comment(comment)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>> {
        (**self).get_comment(id)
    }

    fn find_owned(&self, id: CommentId, owner: UserId) -> RepoResult<Option<Comment>> {
        (**self).find_owned(id, owner)
    }

    fn update_content_if_editable(
        &self,
        id: CommentId,
        owner: UserId,
        content: &str,
        now_ms: i64,
        editable_until: i64,
    ) -> RepoResult<bool> {
        (**self).update_content_if_editable(id, owner, content, now_ms, editable_until)
    }

    fn set_deleted_if_editable(
        &self,
        id: CommentId,
        owner: UserId,
        is_deleted: bool,
        now_ms: i64,
    ) -> RepoResult<bool> {
        (**self).set_deleted_if_editable(id, owner, is_deleted, now_ms)
    }

    fn hard_delete_if_expired(
        &self,
        id: CommentId,
        owner: UserId,
        now_ms: i64,
    ) -> RepoResult<bool> {
        (**self).hard_delete_if_expired(id, owner, now_ms)
    }

    fn list_top_level(&self, limit: u32, offset: u64) -> RepoResult<Vec<CommentRecord>> {
        (**self).list_top_level(limit, offset)
    }

    fn list_replies(&self) -> RepoResult<Vec<CommentRecord>> {
        (**self).list_replies()
    }
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "comments", COMMENT_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_comment_record_row(row)?);
        }
        Ok(records)
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, comment: &Comment) -> RepoResult<bool> {
        comment.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO comments (
                id,
                content,
                user_id,
                parent_id,
                is_deleted,
                editable_until,
                created_at,
                updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE ?4 IS NULL
               OR EXISTS (SELECT 1 FROM comments WHERE id = ?4);",
            params![
                comment.id.to_string(),
                comment.content.as_str(),
                comment.user_id.to_string(),
                comment.parent_id.map(|value| value.to_string()),
                bool_to_int(comment.is_deleted),
                comment.editable_until,
                comment.created_at,
                comment.updated_at,
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>> {
        let mut records = self.query_records(
            &format!("{COMMENT_RECORD_SELECT_SQL} WHERE c.id = ?1;"),
            [id.to_string()],
        )?;
        Ok(records.pop())
    }

    fn find_owned(&self, id: CommentId, owner: UserId) -> RepoResult<Option<Comment>> {
        let mut records = self.query_records(
            &format!("{COMMENT_RECORD_SELECT_SQL} WHERE c.id = ?1 AND c.user_id = ?2;"),
            [id.to_string(), owner.to_string()],
        )?;
        Ok(records.pop().map(|record| record.comment))
    }

    fn update_content_if_editable(
        &self,
        id: CommentId,
        owner: UserId,
        content: &str,
        now_ms: i64,
        editable_until: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE comments
             SET content = ?3,
                 updated_at = ?4,
                 editable_until = ?5
             WHERE id = ?1
               AND user_id = ?2
               AND editable_until > ?4;",
            params![
                id.to_string(),
                owner.to_string(),
                content,
                now_ms,
                editable_until
            ],
        )?;
        Ok(changed == 1)
    }

    fn set_deleted_if_editable(
        &self,
        id: CommentId,
        owner: UserId,
        is_deleted: bool,
        now_ms: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE comments
             SET is_deleted = ?3
             WHERE id = ?1
               AND user_id = ?2
               AND editable_until > ?4;",
            params![
                id.to_string(),
                owner.to_string(),
                bool_to_int(is_deleted),
                now_ms
            ],
        )?;
        Ok(changed == 1)
    }

    fn hard_delete_if_expired(
        &self,
        id: CommentId,
        owner: UserId,
        now_ms: i64,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM comments
             WHERE id = ?1
               AND user_id = ?2
               AND editable_until <= ?3;",
            params![id.to_string(), owner.to_string(), now_ms],
        )?;
        Ok(changed == 1)
    }

    fn list_top_level(&self, limit: u32, offset: u64) -> RepoResult<Vec<CommentRecord>> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.query_records(
            &format!(
                "{COMMENT_RECORD_SELECT_SQL}
                 WHERE c.parent_id IS NULL
                 ORDER BY c.created_at DESC, c.rowid DESC
                 LIMIT ?1 OFFSET ?2;"
            ),
            params![i64::from(limit), offset],
        )
    }

    fn list_replies(&self) -> RepoResult<Vec<CommentRecord>> {
        self.query_records(
            &format!(
                "{COMMENT_RECORD_SELECT_SQL}
                 WHERE c.parent_id IS NOT NULL
                 ORDER BY c.created_at ASC, c.rowid ASC;"
            ),
            params![],
        )
    }
}

fn parse_comment_record_row(row: &Row<'_>) -> RepoResult<CommentRecord> {
    let comment = parse_comment_columns(row, "")?;
    let author = parse_author_columns(row)?;
    Ok(CommentRecord { comment, author })
}

/// Parses comment columns named `{prefix}id`, `{prefix}content`, ...
///
/// Shared with the notification join, which aliases comment columns.
pub(crate) fn parse_comment_columns(row: &Row<'_>, prefix: &str) -> RepoResult<Comment> {
    let column = |name: &str| format!("{prefix}{name}");

    let id_text: String = row.get(column("id").as_str())?;
    let user_text: String = row.get(column("user_id").as_str())?;
    let parent_id = row
        .get::<_, Option<String>>(column("parent_id").as_str())?
        .map(|value| parse_uuid(&value, "comments.parent_id"))
        .transpose()?;

    let comment = Comment {
        id: parse_uuid(&id_text, "comments.id")?,
        content: row.get(column("content").as_str())?,
        user_id: parse_uuid(&user_text, "comments.user_id")?,
        parent_id,
        is_deleted: parse_flag(
            row.get(column("is_deleted").as_str())?,
            "comments.is_deleted",
        )?,
        editable_until: row.get(column("editable_until").as_str())?,
        created_at: row.get(column("created_at").as_str())?,
        updated_at: row.get(column("updated_at").as_str())?,
    };
    comment.validate()?;
    Ok(comment)
}

pub(crate) fn parse_author_columns(row: &Row<'_>) -> RepoResult<Option<UserProfile>> {
    let Some(id_text) = row.get::<_, Option<String>>("author_id")? else {
        return Ok(None);
    };
    Ok(Some(UserProfile {
        id: parse_uuid(&id_text, "users.id")?,
        name: row.get("author_name")?,
        email: row.get("author_email")?,
    }))
}
