//! SNSスクレイパーライブラリ
//!
//! - Facebook / X / Instagram のアクセストークンを検証
//! - 直近の投稿を1ページ分取得して固定スキーマに正規化
//! - 正規化済みデータをパーサーサービスへ転送
//!
//! # トークン指定での使用例
//!
//! ```rust,ignore
//! use social_scraper::{ScrapeRequest, ScrapeResponse, ScraperConfig, ScraperService, TokenSet};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScraperConfig::from_env().unwrap();
//!     let mut service = ScraperService::new(config).unwrap();
//!
//!     let request = ScrapeRequest::tokens(
//!         TokenSet::new()
//!             .with_facebook("EAAB...")
//!             .with_twitter("bearer..."),
//!     );
//!
//!     let result = service.call(request).await;
//!     let response = ScrapeResponse::from_result(&result);
//!     println!("{} {:?}", response.status_code(), response);
//! }
//! ```
//!
//! # 個別スクレイパーの使用例
//!
//! ```rust,ignore
//! use social_scraper::{Provider, Scraper, ScraperConfig, ScraperRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ScraperRegistry::new(ScraperConfig::from_env().unwrap()).unwrap();
//!     let mut scraper = registry.scraper(Provider::Twitter, "bearer...");
//!
//!     scraper.authenticate().await.unwrap();
//!     let raw_posts = scraper.fetch_data().await.unwrap();
//!     let response = scraper.parse_data(raw_posts).await.unwrap();
//!     println!("Parser response: {}", response);
//! }
//! ```

pub mod config;
pub mod error;
pub mod facebook;
pub mod forwarder;
pub mod identity;
pub mod instagram;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod service;
pub mod session;
pub mod traits;
pub mod twitter;
pub mod types;

// 主要な型をリエクスポート
pub use config::{FailurePolicy, ScraperConfig};
pub use error::{ErrorKind, ScraperError};
pub use orchestrator::{Orchestrator, RunReport, ScraperOutcome};
pub use registry::ScraperRegistry;
pub use service::{ScrapeRequest, ScrapeResponse, ScraperService, TokenSet};
pub use session::{SessionState, SocialScraper};
pub use traits::{Forwarder, IdentityResolver, Platform, Scraper};
pub use types::{
    BatchMeta, Credential, ForwardEnvelope, NormalizedPost, Provider, RawPost, UserClaims,
    UserContext, Verification,
};

// プロバイダー別の型もリエクスポート
pub use facebook::{FacebookPlatform, FacebookPost};
pub use forwarder::HttpForwarder;
pub use identity::HttpIdentityResolver;
pub use instagram::InstagramPlatform;
pub use twitter::{Tweet, TwitterPlatform};
