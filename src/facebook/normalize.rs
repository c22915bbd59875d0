//! Graph API の投稿を固定スキーマに整形

use serde_json::Value;
use tracing::warn;

use crate::normalize::{coerce_i64, data_list, id_string, str_or};
use crate::types::RawPost;

use super::types::{
    AttachmentList, CommentSummary, Comments, FacebookPost, ReactionSummary, Reactions,
};

/// 1件を正規化（id が無いレコードは None）
pub fn normalize_post(raw: &RawPost) -> Option<FacebookPost> {
    let obj = raw.as_object()?;
    let id = obj.get("id").and_then(id_string)?;

    let reactions = obj.get("reactions");
    let reaction_summary = reactions.and_then(|r| r.get("summary"));
    let default_reactions = ReactionSummary::default();

    let comments = obj.get("comments");
    let comment_summary = comments.and_then(|c| c.get("summary"));
    let default_comments = CommentSummary::default();

    Some(FacebookPost {
        id,
        created_time: str_or(obj, "created_time", ""),
        permalink_url: str_or(obj, "permalink_url", ""),
        attachments: AttachmentList {
            data: data_list(obj.get("attachments")),
        },
        reactions: Reactions {
            data: data_list(reactions),
            summary: ReactionSummary {
                total_count: coerce_i64(reaction_summary.and_then(|s| s.get("total_count"))),
                viewer_reaction: reaction_summary
                    .and_then(|s| s.get("viewer_reaction"))
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or(default_reactions.viewer_reaction),
            },
        },
        comments: Comments {
            data: data_list(comments),
            summary: CommentSummary {
                order: comment_summary
                    .and_then(|s| s.get("order"))
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or(default_comments.order),
                total_count: coerce_i64(comment_summary.and_then(|s| s.get("total_count"))),
                can_comment: comment_summary
                    .and_then(|s| s.get("can_comment"))
                    .and_then(Value::as_bool)
                    .unwrap_or(default_comments.can_comment),
            },
        },
    })
}

pub fn normalize_posts(raw_posts: &[RawPost]) -> Vec<FacebookPost> {
    raw_posts
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let post = normalize_post(raw);
            if post.is_none() {
                warn!(index, "Skipping Facebook post without id");
            }
            post
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_edges_get_defaults() {
        let post = normalize_post(&json!({"id": "1", "created_time": "t"})).unwrap();
        let value = serde_json::to_value(&post).unwrap();

        assert_eq!(
            value["reactions"]["summary"],
            json!({"total_count": 0, "viewer_reaction": "NONE"})
        );
        assert_eq!(
            value["comments"]["summary"],
            json!({"order": "chronological", "total_count": 0, "can_comment": true})
        );
        assert_eq!(value["attachments"], json!({"data": []}));
        assert_eq!(value["permalink_url"], "");
        assert_eq!(value["created_time"], "t");
    }

    #[test]
    fn test_full_post_is_kept() {
        let raw = json!({
            "id": "123_456",
            "created_time": "2024-03-01T10:00:00+0000",
            "permalink_url": "https://www.facebook.com/123/posts/456",
            "message": "ignored extra field",
            "attachments": {"data": [{"media_type": "photo"}]},
            "reactions": {
                "data": [{"id": "9", "type": "LIKE"}],
                "summary": {"total_count": 12, "viewer_reaction": "LIKE"}
            },
            "comments": {
                "data": [{"id": "c1", "message": "nice"}],
                "summary": {"order": "ranked", "total_count": "3", "can_comment": false}
            }
        });
        let post = normalize_post(&raw).unwrap();

        assert_eq!(post.id, "123_456");
        assert_eq!(post.attachments.data.len(), 1);
        assert_eq!(post.reactions.summary.total_count, 12);
        assert_eq!(post.reactions.summary.viewer_reaction, "LIKE");
        assert_eq!(post.comments.summary.order, "ranked");
        assert_eq!(post.comments.summary.total_count, 3);
        assert!(!post.comments.summary.can_comment);

        let keys: Vec<String> = serde_json::to_value(&post)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert!(!keys.contains(&"message".to_string()));
    }

    #[test]
    fn test_partial_summary_fills_missing_fields() {
        let raw = json!({
            "id": "1",
            "comments": {"summary": {"total_count": 4}}
        });
        let post = normalize_post(&raw).unwrap();
        assert_eq!(post.comments.summary.total_count, 4);
        assert_eq!(post.comments.summary.order, "chronological");
        assert!(post.comments.summary.can_comment);
    }

    #[test]
    fn test_normalizing_normalized_post_is_noop() {
        let first = normalize_post(&json!({"id": "1", "created_time": "t"})).unwrap();
        let again = normalize_post(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_malformed_records_are_dropped() {
        let raw = vec![
            json!({"id": "1"}),
            json!({"created_time": "no id"}),
            json!("not an object"),
            json!({"id": "2"}),
        ];
        let posts = normalize_posts(&raw);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "1");
        assert_eq!(posts[1].id, "2");
    }
}
