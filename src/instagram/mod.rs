//! Instagram スクレイパーモジュール
//!
//! Graph API 連携は未実装。認証は常に成功し、固定の投稿を返す（転送はしない）

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::error::ScraperError;
use crate::traits::Platform;
use crate::types::{NormalizedPost, Provider, RawPost, Verification};

#[derive(Debug, Clone, Default)]
pub struct InstagramPlatform;

impl InstagramPlatform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Platform for InstagramPlatform {
    fn provider(&self) -> Provider {
        Provider::Instagram
    }

    async fn verify(&self, _token: &str) -> Verification {
        info!("Instagram verification is not implemented; accepting token");
        Verification::from_grant(true, Some("me".into()), Default::default(), &[])
    }

    async fn fetch(&self, _user_id: &str, _token: &str) -> Result<Vec<RawPost>, ScraperError> {
        Ok(vec![json!({"post": "Hello IG", "likes": 99})])
    }

    fn normalize(&self, raw_posts: &[RawPost]) -> Vec<NormalizedPost> {
        raw_posts
            .iter()
            .cloned()
            .map(NormalizedPost::Passthrough)
            .collect()
    }

    fn supports_forwarding(&self) -> bool {
        false
    }
}
