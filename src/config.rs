use std::fmt;
use std::time::Duration;

use crate::error::ScraperError;

const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v19.0";
const DEFAULT_TWITTER_API_URL: &str = "https://api.twitter.com/2";

/// 一つのスクレイパーが失敗した時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 実行全体を中断する
    #[default]
    Abort,
    /// 失敗を記録して次のスクレイパーへ進む
    Continue,
}

/// スクレイパー全体の設定（構築後は不変）
#[derive(Clone)]
pub struct ScraperConfig {
    /// Facebook アプリID
    pub app_id: String,
    /// Facebook アプリシークレット
    pub app_secret: String,
    /// Facebook トークンに必要なスコープ
    pub required_scopes: Vec<String>,
    /// X トークンに必要なスコープ
    pub twitter_required_scopes: Vec<String>,
    /// 正規化済みデータの転送先
    pub parser_url: String,
    /// ユーザー識別サービスのベースURL
    pub identity_url: String,
    pub graph_api_url: String,
    pub twitter_api_url: String,
    /// verify / fetch / identity のタイムアウト
    pub request_timeout: Duration,
    /// 転送エンベロープにプラットフォームトークンを含めるか
    pub forward_token: bool,
    pub failure_policy: FailurePolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            required_scopes: Vec::new(),
            twitter_required_scopes: Vec::new(),
            parser_url: String::new(),
            identity_url: String::new(),
            graph_api_url: DEFAULT_GRAPH_API_URL.to_string(),
            twitter_api_url: DEFAULT_TWITTER_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            forward_token: false,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

// シークレットはログに出さない
impl fmt::Debug for ScraperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("required_scopes", &self.required_scopes)
            .field("twitter_required_scopes", &self.twitter_required_scopes)
            .field("parser_url", &self.parser_url)
            .field("identity_url", &self.identity_url)
            .field("graph_api_url", &self.graph_api_url)
            .field("twitter_api_url", &self.twitter_api_url)
            .field("request_timeout", &self.request_timeout)
            .field("forward_token", &self.forward_token)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

impl ScraperConfig {
    pub fn new(parser_url: impl Into<String>) -> Self {
        Self {
            parser_url: parser_url.into(),
            ..Default::default()
        }
    }

    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ScraperError> {
        let var = |key: &str| std::env::var(key).unwrap_or_default();

        let mut config = Self {
            app_id: var("FACEBOOK_APP_ID"),
            app_secret: var("FACEBOOK_APP_SECRET"),
            required_scopes: parse_scopes(&var("SCOPE")),
            twitter_required_scopes: parse_scopes(&var("TWITTER_SCOPE")),
            parser_url: var("PARSER_URL"),
            identity_url: var("AUTHENTICATOR_URL"),
            ..Default::default()
        };

        if let Ok(url) = std::env::var("GRAPH_API_URL") {
            config.graph_api_url = url;
        }
        if let Ok(url) = std::env::var("TWITTER_API_URL") {
            config.twitter_api_url = url;
        }
        if let Ok(secs) = std::env::var("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ScraperError::Config(format!("REQUEST_TIMEOUT_SECS が不正です: {}", secs))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(flag) = std::env::var("FORWARD_TOKEN") {
            config.forward_token = matches!(flag.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    pub fn with_app_credentials(
        mut self,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        self.app_id = app_id.into();
        self.app_secret = app_secret.into();
        self
    }

    /// カンマ区切りのスコープ許可リストを設定
    pub fn with_required_scopes(mut self, scopes: &str) -> Self {
        self.required_scopes = parse_scopes(scopes);
        self
    }

    pub fn with_twitter_required_scopes(mut self, scopes: &str) -> Self {
        self.twitter_required_scopes = parse_scopes(scopes);
        self
    }

    pub fn with_identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = url.into();
        self
    }

    pub fn with_graph_api_url(mut self, url: impl Into<String>) -> Self {
        self.graph_api_url = url.into();
        self
    }

    pub fn with_twitter_api_url(mut self, url: impl Into<String>) -> Self {
        self.twitter_api_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_forward_token(mut self, forward_token: bool) -> Self {
        self.forward_token = forward_token;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// 転送先が設定されているか確認
    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.parser_url.trim().is_empty() {
            return Err(ScraperError::Config("PARSER_URL が設定されていません".into()));
        }
        Ok(())
    }

    /// Facebook のトークン検証に必要なアプリ資格情報を確認
    pub fn validate_app_credentials(&self) -> Result<(), ScraperError> {
        if self.app_id.trim().is_empty() || self.app_secret.trim().is_empty() {
            return Err(ScraperError::Config(
                "FACEBOOK_APP_ID / FACEBOOK_APP_SECRET が設定されていません".into(),
            ));
        }
        Ok(())
    }

    /// Graph API の app access token (`{app_id}|{app_secret}`)
    pub fn app_access_token(&self) -> String {
        format!("{}|{}", self.app_id, self.app_secret)
    }
}

/// カンマ区切りのスコープ文字列を分割（空要素は除外）
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
