//! X 関連の型定義

use serde::{Deserialize, Serialize};

/// 正規化済みツイート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub public_metrics: PublicMetrics,
    pub edit_history_tweet_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMetrics {
    pub retweet_count: i64,
    pub reply_count: i64,
    pub like_count: i64,
    pub quote_count: i64,
    pub bookmark_count: i64,
    pub impression_count: i64,
}
