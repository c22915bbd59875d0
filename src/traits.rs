use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScraperError;
use crate::session::SessionState;
use crate::types::{ForwardEnvelope, NormalizedPost, Provider, RawPost, UserClaims, Verification};

/// プロバイダーごとの機能（検証・取得・正規化）
#[async_trait]
pub trait Platform: Send + Sync {
    fn provider(&self) -> Provider;

    /// トークン検証（失敗時は valid=false を返し、エラーにはしない）
    async fn verify(&self, token: &str) -> Verification;

    /// 検証済みユーザーの投稿を1ページ分取得
    async fn fetch(&self, user_id: &str, token: &str) -> Result<Vec<RawPost>, ScraperError>;

    /// 未加工の投稿を正規化（不正なレコードは除外）
    fn normalize(&self, raw_posts: &[RawPost]) -> Vec<NormalizedPost>;

    /// false の場合は転送せず固定レスポンスを返す
    fn supports_forwarding(&self) -> bool {
        true
    }
}

/// パーサーサービスへの転送
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, envelope: &ForwardEnvelope) -> Result<Value, ScraperError>;
}

/// アプリトークンから利用者とプロバイダーを解決
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, app_token: &str) -> Result<UserClaims, ScraperError>;
}

#[async_trait]
pub trait Scraper: Send + Sync {
    fn provider(&self) -> Provider;

    fn state(&self) -> SessionState;

    /// 取得結果をパーサーへ転送するか
    fn supports_forwarding(&self) -> bool;

    /// トークン検証
    async fn authenticate(&mut self) -> Result<(), ScraperError>;

    /// 投稿取得（認証済みであること）
    async fn fetch_data(&mut self) -> Result<Vec<RawPost>, ScraperError>;

    /// 正規化して転送（取得済みであること）
    async fn parse_data(&mut self, raw_posts: Vec<RawPost>) -> Result<Value, ScraperError>;

    /// 一括実行（authenticate → fetch_data → parse_data）
    async fn execute(&mut self) -> Result<Value, ScraperError> {
        self.authenticate().await?;
        let raw_posts = self.fetch_data().await?;
        self.parse_data(raw_posts).await
    }
}
