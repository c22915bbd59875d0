//! ツイートを固定スキーマに整形

use serde_json::Value;
use tracing::warn;

use crate::normalize::{coerce_i64, id_string, str_or};
use crate::types::RawPost;

use super::types::{PublicMetrics, Tweet};

/// 1件を正規化（id が無いレコードは None）
pub fn normalize_tweet(raw: &RawPost) -> Option<Tweet> {
    let obj = raw.as_object()?;
    let id = obj.get("id").and_then(id_string)?;

    let metrics = obj.get("public_metrics");
    let metric = |key: &str| coerce_i64(metrics.and_then(|m| m.get(key)));

    let edit_history_tweet_ids = match obj.get("edit_history_tweet_ids") {
        Some(Value::Array(ids)) => ids.iter().filter_map(id_string).collect(),
        _ => vec![id.clone()],
    };

    Some(Tweet {
        text: str_or(obj, "text", ""),
        created_at: str_or(obj, "created_at", ""),
        public_metrics: PublicMetrics {
            retweet_count: metric("retweet_count"),
            reply_count: metric("reply_count"),
            like_count: metric("like_count"),
            quote_count: metric("quote_count"),
            bookmark_count: metric("bookmark_count"),
            impression_count: metric("impression_count"),
        },
        edit_history_tweet_ids,
        id,
    })
}

pub fn normalize_tweets(raw_posts: &[RawPost]) -> Vec<Tweet> {
    raw_posts
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let tweet = normalize_tweet(raw);
            if tweet.is_none() {
                warn!(index, "Skipping tweet without id");
            }
            tweet
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_id_and_string_metric() {
        let raw = json!({
            "id": 123,
            "text": "hi",
            "created_at": "t",
            "public_metrics": {"like_count": "5"}
        });
        let tweet = normalize_tweet(&raw).unwrap();

        assert_eq!(tweet.id, "123");
        assert_eq!(tweet.public_metrics.like_count, 5);
        assert_eq!(tweet.public_metrics.retweet_count, 0);
        assert_eq!(tweet.edit_history_tweet_ids, vec!["123"]);

        let value = serde_json::to_value(&tweet).unwrap();
        assert_eq!(value["public_metrics"]["like_count"], json!(5));
        assert_eq!(value["id"], json!("123"));
    }

    #[test]
    fn test_every_key_present_for_bare_tweet() {
        let value = serde_json::to_value(normalize_tweet(&json!({"id": "9"})).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["id", "text", "created_at", "public_metrics", "edit_history_tweet_ids"] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(value["public_metrics"].as_object().unwrap().len(), 6);
        assert_eq!(value["text"], "");
    }

    #[test]
    fn test_bad_metrics_default_to_zero() {
        let raw = json!({
            "id": "1",
            "public_metrics": {
                "retweet_count": "lots",
                "reply_count": null,
                "impression_count": 1234,
                "quote_count": 2.0
            }
        });
        let m = normalize_tweet(&raw).unwrap().public_metrics;
        assert_eq!(m.retweet_count, 0);
        assert_eq!(m.reply_count, 0);
        assert_eq!(m.impression_count, 1234);
        assert_eq!(m.quote_count, 2);
    }

    #[test]
    fn test_edit_history_is_stringified() {
        let raw = json!({"id": "3", "edit_history_tweet_ids": [1, "2", 3]});
        let tweet = normalize_tweet(&raw).unwrap();
        assert_eq!(tweet.edit_history_tweet_ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_normalizing_normalized_tweet_is_noop() {
        let first = normalize_tweet(&json!({"id": 7, "text": "x"})).unwrap();
        let again = normalize_tweet(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_tweets_without_id_are_dropped() {
        let raw = vec![json!({"text": "orphan"}), json!({"id": ""}), json!({"id": "1"})];
        let tweets = normalize_tweets(&raw);
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].id, "1");
    }
}
