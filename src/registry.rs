//! プロバイダー → スクレイパー実装の対応表

use std::sync::Arc;

use tracing::warn;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::facebook::FacebookPlatform;
use crate::forwarder::HttpForwarder;
use crate::identity::HttpIdentityResolver;
use crate::instagram::InstagramPlatform;
use crate::session::SocialScraper;
use crate::traits::{Forwarder, Platform};
use crate::twitter::TwitterPlatform;
use crate::types::{Provider, UserContext};

/// 設定・HTTPクライアント・転送先を共有してスクレイパーを組み立てる
#[derive(Clone)]
pub struct ScraperRegistry {
    config: Arc<ScraperConfig>,
    client: reqwest::Client,
    forwarder: Arc<dyn Forwarder>,
}

impl ScraperRegistry {
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ScraperError::Config(format!("HTTPクライアント初期化失敗: {}", e)))?;
        let forwarder = Arc::new(HttpForwarder::new(client.clone(), config.parser_url.clone()));

        Ok(Self::with_forwarder(config, client, forwarder))
    }

    /// 転送先を差し替えて構築
    pub fn with_forwarder(
        config: ScraperConfig,
        client: reqwest::Client,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        if config.forward_token {
            warn!("forward_token is enabled: platform tokens will be sent to the parser");
        }
        Self {
            config: Arc::new(config),
            client,
            forwarder,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn platform(&self, provider: Provider) -> Box<dyn Platform> {
        match provider {
            Provider::Facebook => Box::new(FacebookPlatform::new(
                self.client.clone(),
                self.config.clone(),
            )),
            Provider::Twitter => Box::new(TwitterPlatform::new(
                self.client.clone(),
                self.config.clone(),
            )),
            Provider::Instagram => Box::new(InstagramPlatform::new()),
        }
    }

    pub fn scraper(&self, provider: Provider, token: impl Into<String>) -> SocialScraper {
        SocialScraper::new(self.platform(provider), self.forwarder.clone(), token)
            .with_forward_token(self.config.forward_token)
    }

    pub fn scraper_with_context(
        &self,
        provider: Provider,
        token: impl Into<String>,
        context: UserContext,
    ) -> SocialScraper {
        self.scraper(provider, token).with_context(context)
    }

    pub fn identity_resolver(&self) -> HttpIdentityResolver {
        HttpIdentityResolver::new(self.client.clone(), self.config.identity_url.clone())
    }
}
