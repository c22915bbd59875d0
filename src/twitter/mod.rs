//! X (Twitter) API v2 スクレイパーモジュール
//!
//! `/users/me` でトークンを検証し、`/users/{id}/tweets` からツイートを取得する

mod normalize;
mod platform;
mod types;

pub use normalize::{normalize_tweet, normalize_tweets};
pub use platform::TwitterPlatform;
pub use types::{PublicMetrics, Tweet};
