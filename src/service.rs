use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::Serialize;
use tower::Service;
use tracing::info;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::registry::ScraperRegistry;
use crate::traits::{IdentityResolver, Scraper};
use crate::types::Provider;

/// プロバイダーごとのトークン（少なくとも1つ必要）
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    pub instagram_token: Option<String>,
    pub facebook_token: Option<String>,
    pub twitter_token: Option<String>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instagram(mut self, token: impl Into<String>) -> Self {
        self.instagram_token = Some(token.into());
        self
    }

    pub fn with_facebook(mut self, token: impl Into<String>) -> Self {
        self.facebook_token = Some(token.into());
        self
    }

    pub fn with_twitter(mut self, token: impl Into<String>) -> Self {
        self.twitter_token = Some(token.into());
        self
    }

    /// 空でないトークンを実行順（Instagram, Facebook, X）で返す
    pub fn entries(&self) -> Vec<(Provider, &str)> {
        [
            (Provider::Instagram, &self.instagram_token),
            (Provider::Facebook, &self.facebook_token),
            (Provider::Twitter, &self.twitter_token),
        ]
        .into_iter()
        .filter_map(|(provider, token)| {
            token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(|t| (provider, t))
        })
        .collect()
    }
}

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub enum ScrapeRequest {
    /// プロバイダーごとのトークンを直接指定
    Tokens(TokenSet),
    /// アプリトークンから識別サービスで解決
    AppToken(String),
}

impl ScrapeRequest {
    pub fn tokens(tokens: TokenSet) -> Self {
        ScrapeRequest::Tokens(tokens)
    }

    pub fn app_token(token: impl Into<String>) -> Self {
        ScrapeRequest::AppToken(token.into())
    }
}

/// 受付側へ返すレスポンス本文
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    status_code: u16,
}

impl ScrapeResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            error_type: None,
            message: None,
            status_code: 200,
        }
    }

    pub fn from_error(err: &ScraperError) -> Self {
        Self {
            status: "error",
            error_type: Some(err.kind().as_str()),
            message: Some(err.to_string()),
            status_code: err.status_code(),
        }
    }

    /// 失敗を記録したレポートは最初のエラーで応答する
    pub fn from_result(result: &Result<RunReport, ScraperError>) -> Self {
        match result {
            Ok(report) => match report.first_error() {
                Some(err) => Self::from_error(err),
                None => Self::success(),
            },
            Err(err) => Self::from_error(err),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Clone)]
pub struct ScraperService {
    registry: ScraperRegistry,
    resolver: Arc<dyn IdentityResolver>,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let registry = ScraperRegistry::new(config)?;
        let resolver = Arc::new(registry.identity_resolver());
        Ok(Self { registry, resolver })
    }

    pub fn with_parts(registry: ScraperRegistry, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { registry, resolver }
    }
}

/// リクエストからオーケストレーターを組み立てる
async fn build_orchestrator(
    req: ScrapeRequest,
    registry: &ScraperRegistry,
    resolver: &dyn IdentityResolver,
) -> Result<Orchestrator, ScraperError> {
    match req {
        ScrapeRequest::Tokens(tokens) => {
            let entries = tokens.entries();
            if entries.is_empty() {
                return Err(ScraperError::InvalidRequest(
                    "At least one token must be provided".into(),
                ));
            }
            let scrapers: Vec<Box<dyn Scraper>> = entries
                .into_iter()
                .map(|(provider, token)| {
                    Box::new(registry.scraper(provider, token)) as Box<dyn Scraper>
                })
                .collect();
            Ok(Orchestrator::new(scrapers).with_failure_policy(registry.config().failure_policy))
        }
        ScrapeRequest::AppToken(app_token) => {
            if app_token.trim().is_empty() {
                return Err(ScraperError::InvalidRequest("app token is empty".into()));
            }
            Orchestrator::from_app_token(&app_token, resolver, registry).await
        }
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = RunReport;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        let mode = match &req {
            ScrapeRequest::Tokens(_) => "tokens",
            ScrapeRequest::AppToken(_) => "app_token",
        };
        info!(mode, "Scrape request received");

        let registry = self.registry.clone();
        let resolver = self.resolver.clone();

        Box::pin(async move {
            let orchestrator = build_orchestrator(req, &registry, resolver.as_ref()).await?;
            let report = orchestrator.run().await?;

            info!(
                scrapers = report.outcomes.len(),
                success = report.is_success(),
                "Scrape request finished"
            );

            Ok(report)
        })
    }
}
