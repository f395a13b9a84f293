use threadline_core::db::open_db_in_memory;
use threadline_core::{
    Comment, CommentService, ManualClock, SqliteCommentRepository, SqliteNotificationRepository,
    SqliteUserRepository, ThreadConfig, ThreadService, UserProfile, UserRepository,
};
use uuid::Uuid;

const START_MS: i64 = 1_700_000_000_000;

struct Fixture {
    conn: rusqlite::Connection,
    clock: ManualClock,
}

impl Fixture {
    fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
            clock: ManualClock::new(START_MS),
        }
    }

    fn post(&self, author: Uuid, content: &str, parent: Option<&Comment>) -> Comment {
        let service = CommentService::with_clock(
            SqliteCommentRepository::try_new(&self.conn).unwrap(),
            SqliteNotificationRepository::try_new(&self.conn).unwrap(),
            self.clock.clone(),
            ThreadConfig::default(),
        );
        self.clock.advance(1_000);
        service
            .create_comment(Some(author), content, parent.map(|parent| parent.id))
            .unwrap()
    }

    fn threads(&self) -> ThreadService<SqliteCommentRepository<'_>> {
        ThreadService::new(SqliteCommentRepository::try_new(&self.conn).unwrap())
    }
}

#[test]
fn page_one_nests_replies_newest_first_then_oldest_first() {
    let fx = Fixture::new();
    let user = Uuid::new_v4();

    let b = fx.post(user, "B", None);
    let a = fx.post(user, "A", None);
    let a1 = fx.post(user, "A1", Some(&a));
    let b1 = fx.post(user, "B1", Some(&b));
    let a2 = fx.post(user, "A2", Some(&a));

    let page = fx.threads().list_page(1).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 10);

    let top: Vec<_> = page.comments.iter().map(|node| node.id()).collect();
    assert_eq!(top, vec![a.id, b.id]);

    let a_replies: Vec<_> = page.comments[0].replies.iter().map(|node| node.id()).collect();
    assert_eq!(a_replies, vec![a1.id, a2.id]);
    let b_replies: Vec<_> = page.comments[1].replies.iter().map(|node| node.id()).collect();
    assert_eq!(b_replies, vec![b1.id]);
}

#[test]
fn nested_replies_keep_order_at_every_depth() {
    let fx = Fixture::new();
    let user = Uuid::new_v4();

    let root = fx.post(user, "root", None);
    let child = fx.post(user, "child", Some(&root));
    let grandchild_1 = fx.post(user, "gc1", Some(&child));
    let grandchild_2 = fx.post(user, "gc2", Some(&child));
    let great = fx.post(user, "great", Some(&grandchild_1));

    let page = fx.threads().list_page(1).unwrap();
    let child_node = &page.comments[0].replies[0];
    assert_eq!(child_node.id(), child.id);
    let grandchildren: Vec<_> = child_node.replies.iter().map(|node| node.id()).collect();
    assert_eq!(grandchildren, vec![grandchild_1.id, grandchild_2.id]);
    assert_eq!(child_node.replies[0].replies[0].id(), great.id);
    assert_eq!(page.comments[0].descendant_count(), 4);
}

#[test]
fn pagination_applies_to_top_level_only() {
    let fx = Fixture::new();
    let user = Uuid::new_v4();

    let mut posted = Vec::new();
    for index in 0..12 {
        posted.push(fx.post(user, &format!("top {index}"), None));
    }
    for _ in 0..15 {
        fx.post(user, "reply", Some(&posted[0]));
    }

    let threads = fx.threads();
    let first = threads.list_page(1).unwrap();
    assert_eq!(first.comments.len(), 10);
    assert_eq!(first.comments[0].id(), posted[11].id);

    let second = threads.list_page(2).unwrap();
    assert_eq!(second.comments.len(), 2);
    assert_eq!(second.comments[1].id(), posted[0].id);
    assert_eq!(second.comments[1].replies.len(), 15);
}

#[test]
fn page_past_the_end_is_empty_not_an_error() {
    let fx = Fixture::new();
    let user = Uuid::new_v4();
    fx.post(user, "only", None);

    let page = fx.threads().list_page(5).unwrap();
    assert_eq!(page.page, 5);
    assert!(page.comments.is_empty());
    assert!(page.is_end());
}

#[test]
fn page_zero_is_served_as_page_one() {
    let fx = Fixture::new();
    let only = fx.post(Uuid::new_v4(), "only", None);

    let page = fx.threads().list_page(0).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.comments[0].id(), only.id);
}

#[test]
fn custom_page_size_is_honoured() {
    let fx = Fixture::new();
    let user = Uuid::new_v4();
    for index in 0..5 {
        fx.post(user, &format!("top {index}"), None);
    }

    let threads = ThreadService::with_config(
        SqliteCommentRepository::try_new(&fx.conn).unwrap(),
        ThreadConfig {
            page_size: 2,
            ..ThreadConfig::default()
        },
    );
    assert_eq!(threads.list_page(3).unwrap().comments.len(), 1);
}

#[test]
fn assembled_nodes_carry_author_profiles_and_deleted_flags() {
    let fx = Fixture::new();
    let alice = UserProfile::new(Uuid::new_v4(), "Alice", "alice@example.com");
    SqliteUserRepository::try_new(&fx.conn)
        .unwrap()
        .upsert_user(&alice)
        .unwrap();
    let anonymous = Uuid::new_v4();

    let top = fx.post(alice.id, "hello", None);
    let reply = fx.post(anonymous, "hi", Some(&top));
    let service = CommentService::with_clock(
        SqliteCommentRepository::try_new(&fx.conn).unwrap(),
        SqliteNotificationRepository::try_new(&fx.conn).unwrap(),
        fx.clock.clone(),
        ThreadConfig::default(),
    );
    service.delete_comment(Some(anonymous), reply.id).unwrap();

    let page = fx.threads().list_page(1).unwrap();
    assert_eq!(page.comments[0].record.author.as_ref(), Some(&alice));
    let reply_node = &page.comments[0].replies[0];
    assert!(reply_node.record.author.is_none());
    assert!(reply_node.record.comment.is_deleted);
}

#[test]
fn visibility_filter_hides_soft_deleted_from_other_viewers() {
    let fx = Fixture::new();
    let owner = Uuid::new_v4();
    let top = fx.post(owner, "visible", None);
    let hidden = fx.post(owner, "hidden", Some(&top));
    fx.post(Uuid::new_v4(), "under hidden", Some(&hidden));

    let service = CommentService::with_clock(
        SqliteCommentRepository::try_new(&fx.conn).unwrap(),
        SqliteNotificationRepository::try_new(&fx.conn).unwrap(),
        fx.clock.clone(),
        ThreadConfig::default(),
    );
    service.delete_comment(Some(owner), hidden.id).unwrap();

    let now = START_MS + 10_000;
    let mut for_owner = fx.threads().list_page(1).unwrap();
    for_owner.retain_visible(Some(owner), now);
    assert_eq!(for_owner.comments[0].replies.len(), 1);

    let mut for_stranger = fx.threads().list_page(1).unwrap();
    for_stranger.retain_visible(Some(Uuid::new_v4()), now);
    assert!(for_stranger.comments[0].replies.is_empty());
}

#[test]
fn page_serializes_with_nested_replies() {
    let fx = Fixture::new();
    let user = Uuid::new_v4();
    let top = fx.post(user, "top", None);
    fx.post(user, "reply", Some(&top));

    let page = fx.threads().list_page(1).unwrap();
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["page"], 1);
    assert_eq!(json["comments"][0]["content"], "top");
    assert_eq!(json["comments"][0]["replies"][0]["content"], "reply");
    assert_eq!(json["comments"][0]["replies"][0]["is_deleted"], false);
}
