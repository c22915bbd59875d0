//! アプリトークンから利用者を解決する識別サービスクライアント

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ScraperError;
use crate::traits::IdentityResolver;
use crate::types::UserClaims;

#[derive(Debug, Deserialize)]
struct GetUserResponse {
    claims: UserClaims,
}

/// `GET {base}/get_user` を呼ぶクライアント
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityResolver {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, app_token: &str) -> Result<UserClaims, ScraperError> {
        if self.base_url.trim().is_empty() {
            return Err(ScraperError::Config("AUTHENTICATOR_URL が設定されていません".into()));
        }

        let url = format!("{}/get_user", self.base_url.trim_end_matches('/'));
        debug!(url = %url, "Resolving app token");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(app_token)
            .send()
            .await
            .map_err(|e| ScraperError::IdentityResolution(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScraperError::IdentityResolution(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: GetUserResponse = resp
            .json()
            .await
            .map_err(|e| {
                ScraperError::IdentityResolution(format!("invalid claims: {}", e.without_url()))
            })?;

        info!(
            provider = %body.claims.provider,
            social_id = %body.claims.social_id,
            "Resolved user"
        );
        Ok(body.claims)
    }
}
