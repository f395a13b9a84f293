//! Comment tree assembly.
//!
//! # Responsibility
//! - Read one page of top-level comments plus every reply.
//! - Rebuild the nested reply structure without touching stored records.
//!
//! # Invariants
//! - Top level is newest first; every reply list is oldest first.
//! - Each reply is attached at most once, so assembly is linear in the
//!   number of replies and always terminates.
//! - Replies whose parent is not reachable from the page are left out.

use crate::config::ThreadConfig;
use crate::model::comment::{CommentId, CommentNode, CommentPage, CommentRecord};
use crate::repo::comment_repo::CommentRepository;
use crate::service::comment_service::log_outcome;
use crate::service::error::ServiceError;
use std::collections::HashMap;

/// Read-side service producing paginated comment trees.
pub struct ThreadService<R> {
    comments: R,
    config: ThreadConfig,
}

impl<R: CommentRepository> ThreadService<R> {
    pub fn new(comments: R) -> Self {
        Self::with_config(comments, ThreadConfig::default())
    }

    pub fn with_config(comments: R, config: ThreadConfig) -> Self {
        Self { comments, config }
    }

    /// Assembles 1-based `page`. Pages past the end come back empty.
    ///
    /// Soft-deleted comments are included with their flag set; callers that
    /// render for a specific viewer apply `CommentPage::retain_visible`.
    pub fn list_page(&self, page: u32) -> Result<CommentPage, ServiceError> {
        let result = self.list_page_inner(page);
        log_outcome("comment_list", &result);
        result
    }

    fn list_page_inner(&self, page: u32) -> Result<CommentPage, ServiceError> {
        let page = page.max(1);
        let top_level = self
            .comments
            .list_top_level(self.config.page_size, self.config.page_offset(page))?;

        // An empty page needs no replies.
        let comments = if top_level.is_empty() {
            Vec::new()
        } else {
            build_comment_tree(top_level, self.comments.list_replies()?)
        };

        Ok(CommentPage {
            page,
            page_size: self.config.page_size,
            comments,
        })
    }
}

/// Nests `replies` under `top_level`.
///
/// Input order is preserved inside every sibling list, so callers pass
/// top-level records newest first and replies oldest first.
pub fn build_comment_tree(
    top_level: Vec<CommentRecord>,
    replies: Vec<CommentRecord>,
) -> Vec<CommentNode> {
    let mut children_by_parent: HashMap<CommentId, Vec<CommentRecord>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.comment.parent_id {
            children_by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|record| attach_replies(record, &mut children_by_parent))
        .collect()
}

fn attach_replies(
    record: CommentRecord,
    children_by_parent: &mut HashMap<CommentId, Vec<CommentRecord>>,
) -> CommentNode {
    // Removing the entry guarantees each child list is consumed once.
    let children = children_by_parent
        .remove(&record.comment.id)
        .unwrap_or_default();
    let replies = children
        .into_iter()
        .map(|child| attach_replies(child, children_by_parent))
        .collect();
    CommentNode { record, replies }
}

#[cfg(test)]
mod tests {
    use super::build_comment_tree;
    use crate::model::comment::{Comment, CommentRecord};
    use uuid::Uuid;

    fn record(parent: Option<&Comment>, content: &str, at: i64) -> CommentRecord {
        CommentRecord {
            comment: Comment::new(
                Uuid::new_v4(),
                content,
                parent.map(|parent| parent.id),
                at,
                at + 1_000,
            ),
            author: None,
        }
    }

    #[test]
    fn nests_replies_at_every_depth_in_input_order() {
        let a = record(None, "a", 20);
        let b = record(None, "b", 10);
        let a1 = record(Some(&a.comment), "a1", 21);
        let a2 = record(Some(&a.comment), "a2", 22);
        let a1x = record(Some(&a1.comment), "a1x", 23);
        let b1 = record(Some(&b.comment), "b1", 24);

        let tree = build_comment_tree(
            vec![a.clone(), b.clone()],
            vec![a1.clone(), a2.clone(), a1x.clone(), b1.clone()],
        );

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id(), a.comment.id);
        assert_eq!(tree[1].id(), b.comment.id);
        let a_replies: Vec<_> = tree[0].replies.iter().map(|node| node.id()).collect();
        assert_eq!(a_replies, vec![a1.comment.id, a2.comment.id]);
        assert_eq!(tree[0].replies[0].replies[0].id(), a1x.comment.id);
        assert_eq!(tree[1].replies[0].id(), b1.comment.id);
        assert_eq!(tree[0].descendant_count(), 3);
    }

    #[test]
    fn drops_replies_with_unreachable_parent() {
        let a = record(None, "a", 20);
        let ghost_parent = record(None, "hard deleted", 5);
        let orphan = record(Some(&ghost_parent.comment), "orphan", 30);

        let tree = build_comment_tree(vec![a], vec![orphan]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn deep_chain_is_fully_materialized() {
        let root = record(None, "root", 0);
        let mut chain = Vec::new();
        let mut parent = root.comment.clone();
        for depth in 1..=50 {
            let child = record(Some(&parent), "deeper", depth);
            parent = child.comment.clone();
            chain.push(child);
        }

        let tree = build_comment_tree(vec![root], chain);
        assert_eq!(tree[0].descendant_count(), 50);
    }
}
