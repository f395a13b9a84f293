use std::cell::Cell;
use threadline_core::db::open_db_in_memory;
use threadline_core::{
    CommentService, ManualClock, Notification, NotificationId, NotificationRecord,
    NotificationRepository, NotificationService, NotFoundTarget, RepoError, RepoResult,
    ServiceError, SqliteCommentRepository, SqliteNotificationRepository, SqliteUserRepository,
    ThreadConfig, UserId, UserProfile, UserRepository,
};
use uuid::Uuid;

const START_MS: i64 = 1_700_000_000_000;

fn comments<'conn>(
    conn: &'conn rusqlite::Connection,
    clock: &ManualClock,
) -> CommentService<SqliteCommentRepository<'conn>, SqliteNotificationRepository<'conn>, ManualClock>
{
    CommentService::with_clock(
        SqliteCommentRepository::try_new(conn).unwrap(),
        SqliteNotificationRepository::try_new(conn).unwrap(),
        clock.clone(),
        ThreadConfig::default(),
    )
}

fn inbox(conn: &rusqlite::Connection) -> NotificationService<SqliteNotificationRepository<'_>> {
    NotificationService::new(SqliteNotificationRepository::try_new(conn).unwrap())
}

#[test]
fn reply_from_other_user_notifies_parent_author_once() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let parent = service.create_comment(Some(alice), "question", None).unwrap();
    clock.advance(1_000);
    let reply = service
        .create_comment(Some(bob), "answer", Some(parent.id))
        .unwrap();

    let alice_inbox = inbox(&conn).list_notifications(Some(alice)).unwrap();
    assert_eq!(alice_inbox.len(), 1);
    let record = &alice_inbox[0];
    assert_eq!(record.notification.user_id, alice);
    assert_eq!(record.notification.comment_id, reply.id);
    assert!(!record.notification.is_read);
    assert_eq!(record.notification.created_at, START_MS + 1_000);
    assert_eq!(record.comment.as_ref().map(|c| c.id), Some(reply.id));

    assert!(inbox(&conn).list_notifications(Some(bob)).unwrap().is_empty());
}

#[test]
fn self_reply_creates_no_notification() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();

    let parent = service.create_comment(Some(alice), "thinking", None).unwrap();
    service
        .create_comment(Some(alice), "more thoughts", Some(parent.id))
        .unwrap();

    assert!(inbox(&conn)
        .list_notifications(Some(alice))
        .unwrap()
        .is_empty());
}

#[test]
fn nested_reply_notifies_immediate_parent_author_only() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    let top = service.create_comment(Some(alice), "top", None).unwrap();
    let middle = service
        .create_comment(Some(bob), "middle", Some(top.id))
        .unwrap();
    service
        .create_comment(Some(carol), "bottom", Some(middle.id))
        .unwrap();

    let inbox = inbox(&conn);
    assert_eq!(inbox.list_notifications(Some(alice)).unwrap().len(), 1);
    assert_eq!(inbox.list_notifications(Some(bob)).unwrap().len(), 1);
    assert!(inbox.list_notifications(Some(carol)).unwrap().is_empty());
}

#[test]
fn list_is_newest_first_and_joins_reply_author() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();
    let bob = UserProfile::new(Uuid::new_v4(), "Bob", "bob@example.com");
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .upsert_user(&bob)
        .unwrap();

    let parent = service.create_comment(Some(alice), "post", None).unwrap();
    clock.advance(1_000);
    let older = service
        .create_comment(Some(bob.id), "first reply", Some(parent.id))
        .unwrap();
    clock.advance(1_000);
    let newer = service
        .create_comment(Some(bob.id), "second reply", Some(parent.id))
        .unwrap();

    let records = inbox(&conn).list_notifications(Some(alice)).unwrap();
    let order: Vec<_> = records
        .iter()
        .map(|record| record.notification.comment_id)
        .collect();
    assert_eq!(order, vec![newer.id, older.id]);
    assert_eq!(records[0].author.as_ref(), Some(&bob));
}

#[test]
fn toggle_read_twice_restores_original_state() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();
    let parent = service.create_comment(Some(alice), "post", None).unwrap();
    service
        .create_comment(Some(Uuid::new_v4()), "reply", Some(parent.id))
        .unwrap();

    let inbox = inbox(&conn);
    let id = inbox.list_notifications(Some(alice)).unwrap()[0]
        .notification
        .id;
    assert_eq!(inbox.count_unread(Some(alice)).unwrap(), 1);

    assert!(inbox.toggle_read(Some(alice), id).unwrap());
    assert_eq!(inbox.count_unread(Some(alice)).unwrap(), 0);
    assert!(!inbox.toggle_read(Some(alice), id).unwrap());

    let stored = SqliteNotificationRepository::try_new(&conn)
        .unwrap()
        .get_notification(id)
        .unwrap()
        .unwrap();
    assert!(!stored.is_read);
}

#[test]
fn toggle_read_by_other_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();
    let parent = service.create_comment(Some(alice), "post", None).unwrap();
    service
        .create_comment(Some(Uuid::new_v4()), "reply", Some(parent.id))
        .unwrap();

    let inbox = inbox(&conn);
    let id = inbox.list_notifications(Some(alice)).unwrap()[0]
        .notification
        .id;

    let err = inbox.toggle_read(Some(Uuid::new_v4()), id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound(NotFoundTarget::Notification(found)) if found == id
    ));
    let err = inbox
        .toggle_read(Some(alice), Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(matches!(
        inbox.toggle_read(None, id).unwrap_err(),
        ServiceError::Unauthenticated
    ));
}

#[test]
fn notification_outlives_hard_deleted_reply() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(START_MS);
    let service = comments(&conn, &clock);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let parent = service.create_comment(Some(alice), "post", None).unwrap();
    let reply = service
        .create_comment(Some(bob), "reply", Some(parent.id))
        .unwrap();

    clock.set(reply.editable_until);
    service.delete_comment(Some(bob), reply.id).unwrap();

    let records = inbox(&conn).list_notifications(Some(alice)).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].comment.is_none());
    assert!(records[0].author.is_none());
}

/// Store whose inserts always fail, counting attempts.
struct BrokenNotificationStore {
    attempts: Cell<u32>,
}

impl NotificationRepository for BrokenNotificationStore {
    fn create_notification(&self, _notification: &Notification) -> RepoResult<()> {
        self.attempts.set(self.attempts.get() + 1);
        Err(RepoError::InvalidData("notification store offline".to_string()))
    }

    fn get_notification(&self, _id: NotificationId) -> RepoResult<Option<Notification>> {
        Ok(None)
    }

    fn list_for_recipient(&self, _recipient: UserId) -> RepoResult<Vec<NotificationRecord>> {
        Ok(Vec::new())
    }

    fn toggle_read(&self, _id: NotificationId, _recipient: UserId) -> RepoResult<Option<bool>> {
        Ok(None)
    }

    fn count_unread(&self, _recipient: UserId) -> RepoResult<u64> {
        Ok(0)
    }
}

#[test]
fn failed_notification_does_not_fail_reply_creation() {
    let conn = open_db_in_memory().unwrap();
    let store = BrokenNotificationStore {
        attempts: Cell::new(0),
    };
    let service = CommentService::with_clock(
        SqliteCommentRepository::try_new(&conn).unwrap(),
        &store,
        ManualClock::new(START_MS),
        ThreadConfig::default(),
    );

    let parent = service
        .create_comment(Some(Uuid::new_v4()), "post", None)
        .unwrap();
    let reply = service
        .create_comment(Some(Uuid::new_v4()), "reply", Some(parent.id))
        .unwrap();

    assert_eq!(store.attempts.get(), 1);
    assert_eq!(service.get_comment(reply.id).unwrap().comment, reply);
}
