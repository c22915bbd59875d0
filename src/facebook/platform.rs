//! Facebook Graph API クライアント

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Platform;
use crate::types::{NormalizedPost, Provider, RawPost, Verification};

use super::normalize::normalize_posts;
use super::types::DebugTokenResponse;

/// 投稿取得時のフィールド指定
const POST_FIELDS: &str = "id,created_time,permalink_url,attachments,\
reactions.summary(total_count,viewer_reaction),comments.summary(true)";

pub struct FacebookPlatform {
    client: reqwest::Client,
    config: Arc<ScraperConfig>,
}

impl FacebookPlatform {
    pub fn new(client: reqwest::Client, config: Arc<ScraperConfig>) -> Self {
        Self { client, config }
    }

    /// `GET /debug_token`（アプリトークンは Authorization ヘッダーで送る）
    fn debug_token_request(&self, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/debug_token", self.config.graph_api_url);
        self.client
            .get(url)
            .bearer_auth(self.config.app_access_token())
            .query(&[("input_token", token)])
    }

    /// `GET /{user_id}/posts`（1ページ分のみ）
    fn posts_request(&self, user_id: &str, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/posts", self.config.graph_api_url, user_id);
        let limit = Provider::Facebook.page_size().to_string();
        self.client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", POST_FIELDS), ("limit", limit.as_str())])
    }

    async fn debug_token(&self, token: &str) -> Result<DebugTokenResponse, ScraperError> {
        debug!(url = %self.config.graph_api_url, "Calling debug_token");

        let resp = self.debug_token_request(token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScraperError::Http(format!("debug_token status {}: {}", status, body)));
        }

        Ok(resp.json().await?)
    }
}

/// debug_token の結果を判定する
pub(crate) fn evaluate_debug_token(
    resp: DebugTokenResponse,
    app_id: &str,
    required_scopes: &[String],
) -> Verification {
    let data = resp.data;

    if let Some(issued_for) = data.app_id.as_deref() {
        if !app_id.is_empty() && issued_for != app_id {
            return Verification::rejected(format!("token was issued for app {}", issued_for));
        }
    }

    let granted: BTreeSet<String> = data.scopes.into_iter().collect();
    Verification::from_grant(data.is_valid, data.user_id, granted, required_scopes)
}

/// `{ "data": [...] }` から投稿配列を取り出す
pub(crate) fn extract_posts(body: Value) -> Result<Vec<RawPost>, ScraperError> {
    match body {
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(posts)) => Ok(posts),
            Some(other) => Err(ScraperError::InvalidResponse(format!(
                "data is not a list: {}",
                other
            ))),
            None => Err(ScraperError::InvalidResponse("response has no data field".into())),
        },
        other => Err(ScraperError::InvalidResponse(format!(
            "response is not an object: {}",
            other
        ))),
    }
}

#[async_trait]
impl Platform for FacebookPlatform {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    async fn verify(&self, token: &str) -> Verification {
        if let Err(e) = self.config.validate_app_credentials() {
            warn!(error = %e, "Facebook verification skipped");
            return Verification::rejected(e.to_string());
        }

        match self.debug_token(token).await {
            Ok(resp) => {
                let verification =
                    evaluate_debug_token(resp, &self.config.app_id, &self.config.required_scopes);
                if let Some(reason) = &verification.reason {
                    warn!(reason = %reason, "Facebook token rejected");
                }
                verification
            }
            Err(e) => {
                warn!(error = %e, "Facebook token verification failed");
                Verification::rejected(e.to_string())
            }
        }
    }

    async fn fetch(&self, user_id: &str, token: &str) -> Result<Vec<RawPost>, ScraperError> {
        debug!(user_id = %user_id, "Fetching Facebook posts");

        let resp = self.posts_request(user_id, token).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScraperError::Http(format!("posts status {}: {}", status, body)));
        }

        let body: Value = resp.json().await?;
        let posts = extract_posts(body)?;
        info!(count = posts.len(), "Fetched Facebook posts");
        Ok(posts)
    }

    fn normalize(&self, raw_posts: &[RawPost]) -> Vec<NormalizedPost> {
        normalize_posts(raw_posts)
            .into_iter()
            .map(NormalizedPost::Facebook)
            .collect()
    }
}
