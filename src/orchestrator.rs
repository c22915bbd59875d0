//! 複数スクレイパーを順番に実行する

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{error, info};

use crate::config::FailurePolicy;
use crate::error::ScraperError;
use crate::registry::ScraperRegistry;
use crate::traits::{IdentityResolver, Scraper};
use crate::types::Provider;

/// スクレイパー1件の実行結果
#[derive(Debug, Serialize)]
pub struct ScraperOutcome {
    pub provider: Provider,
    /// 取得した未加工投稿数
    pub fetched: usize,
    pub forwarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<ScraperError>,
}

fn serialize_error<S: Serializer>(
    error: &Option<ScraperError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// 実行全体のレポート
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ScraperOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    pub fn first_error(&self) -> Option<&ScraperError> {
        self.outcomes.iter().find_map(|o| o.error.as_ref())
    }
}

pub struct Orchestrator {
    scrapers: Vec<Box<dyn Scraper>>,
    policy: FailurePolicy,
}

impl Orchestrator {
    /// 生成済みのスクレイパーで構築
    pub fn new(scrapers: Vec<Box<dyn Scraper>>) -> Self {
        Self {
            scrapers,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// アプリトークンから識別サービス経由でスクレイパーを1つ構築
    pub async fn from_app_token(
        app_token: &str,
        resolver: &dyn IdentityResolver,
        registry: &ScraperRegistry,
    ) -> Result<Self, ScraperError> {
        let claims = resolver.resolve(app_token).await?;
        let provider: Provider = claims.provider.parse()?;

        let scraper =
            registry.scraper_with_context(provider, claims.social_token.clone(), claims.context());

        Ok(Self::new(vec![Box::new(scraper)]).with_failure_policy(registry.config().failure_policy))
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.scrapers.iter().map(|s| s.provider()).collect()
    }

    /// 登録順に実行（スクレイパーは使い捨てのため self を消費する）
    pub async fn run(self) -> Result<RunReport, ScraperError> {
        let started_at = Utc::now();
        info!(scrapers = self.scrapers.len(), policy = ?self.policy, "Starting scraping workflow");

        let mut outcomes = Vec::with_capacity(self.scrapers.len());
        for mut scraper in self.scrapers {
            let provider = scraper.provider();
            info!(provider = %provider, "Running scraper");

            let mut outcome = ScraperOutcome {
                provider,
                fetched: 0,
                forwarded: false,
                response: None,
                error: None,
            };

            if let Err(e) = drive(scraper.as_mut(), &mut outcome).await {
                error!(provider = %provider, error = %e, "Scraper failed");
                match self.policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Continue => outcome.error = Some(e),
                }
            }
            outcomes.push(outcome);
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(success = report.is_success(), "Workflow complete");
        Ok(report)
    }
}

async fn drive(
    scraper: &mut dyn Scraper,
    outcome: &mut ScraperOutcome,
) -> Result<(), ScraperError> {
    scraper.authenticate().await?;

    let raw_posts = scraper.fetch_data().await?;
    outcome.fetched = raw_posts.len();
    info!(provider = %outcome.provider, count = raw_posts.len(), "Received raw data");

    let response = scraper.parse_data(raw_posts).await?;
    outcome.forwarded = scraper.supports_forwarding();
    outcome.response = Some(response);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::session::tests::{FakePlatform, RecordingForwarder};
    use crate::session::SocialScraper;
    use crate::types::{UserClaims, Verification};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    struct FakeResolver {
        provider: &'static str,
    }

    #[async_trait]
    impl IdentityResolver for FakeResolver {
        async fn resolve(&self, app_token: &str) -> Result<UserClaims, ScraperError> {
            if app_token != "app-token" {
                return Err(ScraperError::IdentityResolution("status 401".into()));
            }
            Ok(UserClaims {
                provider: self.provider.to_string(),
                social_id: "10158".into(),
                social_token: "social-token".into(),
                name: "Jane".into(),
                email: "jane@example.com".into(),
            })
        }
    }

    fn registry(forwarder: Arc<RecordingForwarder>) -> ScraperRegistry {
        ScraperRegistry::with_forwarder(
            ScraperConfig::new("http://parser"),
            reqwest::Client::new(),
            forwarder,
        )
    }

    fn fake(platform: FakePlatform, forwarder: &Arc<RecordingForwarder>) -> Box<dyn Scraper> {
        Box::new(SocialScraper::new(Box::new(platform), forwarder.clone(), "t"))
    }

    fn rejecting(provider: Provider) -> FakePlatform {
        let mut platform = FakePlatform::valid(provider, vec![json!({"id": "1"})]);
        platform.verification = Verification::rejected("expired");
        platform
    }

    #[tokio::test]
    async fn test_run_in_order() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let tweets = vec![json!({"id": "a"}), json!({"id": "b"})];
        let orchestrator = Orchestrator::new(vec![
            fake(FakePlatform::valid(Provider::Facebook, vec![json!({"id": "1"})]), &forwarder),
            fake(FakePlatform::valid(Provider::Twitter, tweets), &forwarder),
        ]);
        assert_eq!(orchestrator.providers(), vec![Provider::Facebook, Provider::Twitter]);

        let report = orchestrator.run().await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.outcomes[0].fetched, 1);
        assert_eq!(report.outcomes[1].fetched, 2);
        assert!(report.outcomes.iter().all(|o| o.forwarded));
        assert!(report.finished_at >= report.started_at);

        let sent = forwarder.sent.lock().unwrap();
        assert_eq!(sent[0]["platform"], "facebook");
        assert_eq!(sent[1]["platform"], "twitter");
    }

    #[tokio::test]
    async fn test_abort_stops_remaining_scrapers() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let second = FakePlatform::valid(Provider::Twitter, vec![json!({"id": "a"})]);
        let second_calls = second.fetch_calls.clone();

        let result = Orchestrator::new(vec![
            fake(rejecting(Provider::Facebook), &forwarder),
            fake(second, &forwarder),
        ])
        .run()
        .await;

        assert!(matches!(result, Err(ScraperError::Authentication(_))));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert!(forwarder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_continue_records_failure() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let report = Orchestrator::new(vec![
            fake(rejecting(Provider::Facebook), &forwarder),
            fake(FakePlatform::valid(Provider::Twitter, vec![json!({"id": "a"})]), &forwarder),
        ])
        .with_failure_policy(FailurePolicy::Continue)
        .run()
        .await
        .unwrap();

        assert!(!report.is_success());
        assert!(matches!(report.first_error(), Some(ScraperError::Authentication(_))));
        assert!(report.outcomes[1].forwarded);
        assert_eq!(forwarder.sent.lock().unwrap().len(), 1);

        let body = serde_json::to_value(&report).unwrap();
        assert!(body["outcomes"][0]["error"].as_str().unwrap().contains("expired"));
        assert!(body["outcomes"][1].get("error").is_none());
    }

    #[tokio::test]
    async fn test_from_app_token_builds_single_scraper() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let orchestrator = Orchestrator::from_app_token(
            "app-token",
            &FakeResolver { provider: "facebook" },
            &registry(forwarder),
        )
        .await
        .unwrap();

        assert_eq!(orchestrator.providers(), vec![Provider::Facebook]);
    }

    #[tokio::test]
    async fn test_from_app_token_runs_instagram() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let report = Orchestrator::from_app_token(
            "app-token",
            &FakeResolver { provider: "instagram" },
            &registry(forwarder),
        )
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].fetched, 1);
        assert!(!report.outcomes[0].forwarded);
        assert!(report.outcomes[0].response.is_some());
    }

    #[tokio::test]
    async fn test_non_forwarding_platform_is_not_reported_as_forwarded() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let mut stub = FakePlatform::valid(Provider::Instagram, vec![json!({"id": "1"})]);
        stub.forwarding = false;

        let report = Orchestrator::new(vec![
            fake(stub, &forwarder),
            fake(FakePlatform::valid(Provider::Twitter, vec![json!({"id": "a"})]), &forwarder),
        ])
        .run()
        .await
        .unwrap();

        assert!(report.is_success());
        assert!(!report.outcomes[0].forwarded);
        assert!(report.outcomes[1].forwarded);
        assert_eq!(forwarder.sent.lock().unwrap().len(), 1);

        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body["outcomes"][0]["forwarded"], false);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_fatal() {
        let result = Orchestrator::from_app_token(
            "app-token",
            &FakeResolver { provider: "myspace" },
            &registry(Arc::new(RecordingForwarder::default())),
        )
        .await;

        let err = result.err().unwrap();
        assert!(matches!(err, ScraperError::UnknownProvider(ref p) if p == "myspace"));
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_identity_failure_is_authentication_error() {
        let result = Orchestrator::from_app_token(
            "wrong",
            &FakeResolver { provider: "facebook" },
            &registry(Arc::new(RecordingForwarder::default())),
        )
        .await;

        assert_eq!(result.err().unwrap().status_code(), 401);
    }
}
