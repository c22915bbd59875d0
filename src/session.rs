//! 認証 → 取得 → 正規化・転送 を順に進めるスクレイパー本体

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::ScraperError;
use crate::traits::{Forwarder, Platform, Scraper};
use crate::types::{Credential, ForwardEnvelope, Provider, RawPost, UserContext};

/// セッション状態（後戻りなし、失敗・転送完了で終端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Fetched,
    Forwarded,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated => "authenticated",
            SessionState::Fetched => "fetched",
            SessionState::Forwarded => "forwarded",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Forwarded | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// プロバイダー機能と転送先を束ねた1回限りのスクレイパー
pub struct SocialScraper {
    platform: Box<dyn Platform>,
    forwarder: Arc<dyn Forwarder>,
    credential: Credential,
    context: Option<UserContext>,
    forward_token: bool,
    state: SessionState,
}

impl SocialScraper {
    pub fn new(
        platform: Box<dyn Platform>,
        forwarder: Arc<dyn Forwarder>,
        token: impl Into<String>,
    ) -> Self {
        let credential = Credential::new(platform.provider(), token);
        Self {
            platform,
            forwarder,
            credential,
            context: None,
            forward_token: false,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn with_context(mut self, context: UserContext) -> Self {
        self.context = Some(context);
        self
    }

    /// 転送エンベロープにトークンを含める
    pub fn with_forward_token(mut self, forward_token: bool) -> Self {
        self.forward_token = forward_token;
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn fail(&mut self, err: ScraperError) -> ScraperError {
        warn!(
            provider = %self.credential.provider,
            from = %self.state,
            error = %err,
            "Scraper step failed"
        );
        self.state = SessionState::Failed;
        err
    }

    fn guard(&self, operation: &'static str, expected: SessionState) -> Result<(), ScraperError> {
        if self.state == expected {
            return Ok(());
        }
        match self.state {
            SessionState::Unauthenticated if operation == "fetch_data" => {
                Err(ScraperError::NotAuthenticated)
            }
            state => Err(ScraperError::InvalidState {
                operation,
                state: state.as_str(),
            }),
        }
    }
}

#[async_trait]
impl Scraper for SocialScraper {
    fn provider(&self) -> Provider {
        self.credential.provider
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn supports_forwarding(&self) -> bool {
        self.platform.supports_forwarding()
    }

    async fn authenticate(&mut self) -> Result<(), ScraperError> {
        self.guard("authenticate", SessionState::Unauthenticated)?;

        if let Some(ctx) = &self.context {
            info!(
                provider = %self.credential.provider,
                name = %ctx.name,
                social_id = %ctx.social_id,
                "Authenticating"
            );
        } else {
            info!(provider = %self.credential.provider, "Authenticating");
        }

        let verification = self.platform.verify(&self.credential.raw_token).await;
        match (verification.valid, verification.user_id) {
            (true, Some(user_id)) => {
                debug!(user_id = %user_id, scopes = ?verification.scopes, "Token verified");
                self.credential.resolved_user_id = Some(user_id);
                self.state = SessionState::Authenticated;
                Ok(())
            }
            _ => {
                let reason = verification
                    .reason
                    .unwrap_or_else(|| "token verification failed".to_string());
                Err(self.fail(ScraperError::Authentication(format!(
                    "{}: {}",
                    self.credential.provider, reason
                ))))
            }
        }
    }

    async fn fetch_data(&mut self) -> Result<Vec<RawPost>, ScraperError> {
        self.guard("fetch_data", SessionState::Authenticated)?;

        let user_id = match self.credential.resolved_user_id.clone() {
            Some(id) => id,
            None => return Err(self.fail(ScraperError::NotAuthenticated)),
        };

        info!(provider = %self.credential.provider, "Fetching posts");
        match self.platform.fetch(&user_id, &self.credential.raw_token).await {
            Ok(posts) => {
                info!(provider = %self.credential.provider, count = posts.len(), "Fetched posts");
                self.state = SessionState::Fetched;
                Ok(posts)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn parse_data(&mut self, raw_posts: Vec<RawPost>) -> Result<Value, ScraperError> {
        self.guard("parse_data", SessionState::Fetched)?;

        let provider = self.credential.provider;
        let posts = self.platform.normalize(&raw_posts);
        if posts.len() < raw_posts.len() {
            warn!(
                provider = %provider,
                dropped = raw_posts.len() - posts.len(),
                "Dropped malformed records"
            );
        }

        if !self.platform.supports_forwarding() {
            info!(provider = %provider, "Forwarding not supported; returning canned result");
            self.state = SessionState::Forwarded;
            return Ok(json!({
                "platform": provider,
                "forwarded": false,
                "data": posts,
            }));
        }

        let token = self.forward_token.then(|| self.credential.raw_token.clone());
        let envelope = ForwardEnvelope::new(provider, posts, None, token);

        info!(
            provider = %provider,
            count = envelope.payload.data.len(),
            "Forwarding normalized posts"
        );
        match self.forwarder.forward(&envelope).await {
            Ok(response) => {
                self.state = SessionState::Forwarded;
                Ok(response)
            }
            Err(e) => Err(self.fail(e)),
        }
    }
}
