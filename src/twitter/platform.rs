//! X API v2 クライアント

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::normalize::id_string;
use crate::traits::Platform;
use crate::types::{NormalizedPost, Provider, RawPost, Verification};

use super::normalize::normalize_tweets;

const TWEET_FIELDS: &str = "created_at,public_metrics,edit_history_tweet_ids";
const EXCLUDE: &str = "retweets,replies";
/// 付与スコープを返すレスポンスヘッダー
const SCOPE_HEADER: &str = "x-oauth-scopes";

pub struct TwitterPlatform {
    client: reqwest::Client,
    config: Arc<ScraperConfig>,
}

impl TwitterPlatform {
    pub fn new(client: reqwest::Client, config: Arc<ScraperConfig>) -> Self {
        Self { client, config }
    }

    /// `GET /users/me`
    fn users_me_request(&self, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/users/me", self.config.twitter_api_url);
        self.client.get(url).bearer_auth(token)
    }

    /// `GET /users/{id}/tweets`（リツイート・リプライを除く1ページ分）
    fn tweets_request(&self, user_id: &str, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/users/{}/tweets", self.config.twitter_api_url, user_id);
        let max_results = Provider::Twitter.page_size().to_string();
        self.client.get(url).bearer_auth(token).query(&[
            ("max_results", max_results.as_str()),
            ("exclude", EXCLUDE),
            ("tweet.fields", TWEET_FIELDS),
        ])
    }

    async fn users_me(&self, token: &str) -> Result<(Value, Option<String>), ScraperError> {
        debug!(url = %self.config.twitter_api_url, "Calling users/me");

        let resp = self.users_me_request(token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScraperError::Http(format!("users/me status {}: {}", status, body)));
        }

        let scopes = resp
            .headers()
            .get(SCOPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body: Value = resp.json().await?;
        Ok((body, scopes))
    }
}

/// スコープヘッダーを分割（スペース区切り・カンマ区切りの両方を許容）
fn parse_scope_header(header: &str) -> BTreeSet<String> {
    header
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// `/users/me` の結果を判定する
pub(crate) fn evaluate_users_me(
    body: &Value,
    scope_header: Option<&str>,
    required_scopes: &[String],
) -> Verification {
    let user_id = body
        .get("data")
        .and_then(|d| d.get("id"))
        .and_then(id_string);
    let granted = scope_header.map(parse_scope_header).unwrap_or_default();
    Verification::from_grant(true, user_id, granted, required_scopes)
}

/// ツイート一覧を取り出す（該当なしの場合 data は省略される）
pub(crate) fn extract_tweets(body: Value) -> Result<Vec<RawPost>, ScraperError> {
    let Value::Object(mut obj) = body else {
        return Err(ScraperError::InvalidResponse(
            "response is not an object".into(),
        ));
    };

    match obj.remove("data") {
        Some(Value::Array(tweets)) => Ok(tweets),
        Some(other) => Err(ScraperError::InvalidResponse(format!(
            "data is not a list: {}",
            other
        ))),
        None => match obj.get("errors") {
            Some(errors) => Err(ScraperError::InvalidResponse(format!(
                "response has errors: {}",
                errors
            ))),
            None => Ok(Vec::new()),
        },
    }
}

#[async_trait]
impl Platform for TwitterPlatform {
    fn provider(&self) -> Provider {
        Provider::Twitter
    }

    async fn verify(&self, token: &str) -> Verification {
        match self.users_me(token).await {
            Ok((body, scopes)) => {
                let verification = evaluate_users_me(
                    &body,
                    scopes.as_deref(),
                    &self.config.twitter_required_scopes,
                );
                if let Some(reason) = &verification.reason {
                    warn!(reason = %reason, "X token rejected");
                }
                verification
            }
            Err(e) => {
                warn!(error = %e, "X token verification failed");
                Verification::rejected(e.to_string())
            }
        }
    }

    async fn fetch(&self, user_id: &str, token: &str) -> Result<Vec<RawPost>, ScraperError> {
        debug!(user_id = %user_id, "Fetching tweets");

        let resp = self.tweets_request(user_id, token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScraperError::Http(format!("tweets status {}: {}", status, body)));
        }

        let body: Value = resp.json().await?;
        let tweets = extract_tweets(body)?;
        info!(count = tweets.len(), "Fetched tweets");
        Ok(tweets)
    }

    fn normalize(&self, raw_posts: &[RawPost]) -> Vec<NormalizedPost> {
        normalize_tweets(raw_posts)
            .into_iter()
            .map(NormalizedPost::Tweet)
            .collect()
    }
}
