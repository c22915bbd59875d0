//! プロバイダー共通の型定義

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScraperError;
use crate::facebook::FacebookPost;
use crate::twitter::Tweet;

/// 対応SNSプラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Facebook,
    Twitter,
    Instagram,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Facebook => "facebook",
            Provider::Twitter => "twitter",
            Provider::Instagram => "instagram",
        }
    }

    /// 1回の取得で読む投稿数の上限
    pub fn page_size(&self) -> u32 {
        match self {
            Provider::Facebook | Provider::Instagram => 150,
            Provider::Twitter => 100,
        }
    }

    /// 転送時のタイムアウト（Facebookはコメント・リアクション込みでペイロードが大きい）
    pub fn forward_timeout(&self) -> Duration {
        match self {
            Provider::Facebook => Duration::from_secs(240),
            Provider::Twitter | Provider::Instagram => Duration::from_secs(60),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Provider::Facebook),
            "twitter" | "x" => Ok(Provider::Twitter),
            "instagram" => Ok(Provider::Instagram),
            other => Err(ScraperError::UnknownProvider(other.to_string())),
        }
    }
}

/// プラットフォームの認証情報（1回の実行でのみ保持）
#[derive(Clone)]
pub struct Credential {
    pub provider: Provider,
    pub raw_token: String,
    /// 認証成功時に一度だけ設定される
    pub resolved_user_id: Option<String>,
}

impl Credential {
    pub fn new(provider: Provider, raw_token: impl Into<String>) -> Self {
        Self {
            provider,
            raw_token: raw_token.into(),
            resolved_user_id: None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("raw_token", &"<redacted>")
            .field("resolved_user_id", &self.resolved_user_id)
            .finish()
    }
}

/// 識別サービスから渡される利用者情報（ログ用、処理には使わない）
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub name: String,
    pub email: String,
    pub social_id: String,
}

/// `GET /get_user` の claims
#[derive(Debug, Clone, Deserialize)]
pub struct UserClaims {
    pub provider: String,
    #[serde(default)]
    pub social_id: String,
    pub social_token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl UserClaims {
    pub fn context(&self) -> UserContext {
        UserContext {
            name: self.name.clone(),
            email: self.email.clone(),
            social_id: self.social_id.clone(),
        }
    }
}

/// トークン検証結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    pub user_id: Option<String>,
    pub scopes: BTreeSet<String>,
    /// 拒否理由
    pub reason: Option<String>,
}

impl Verification {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            user_id: None,
            scopes: BTreeSet::new(),
            reason: Some(reason.into()),
        }
    }

    /// イントロスペクション結果と必須スコープから判定する
    pub fn from_grant(
        is_valid: bool,
        user_id: Option<String>,
        granted: BTreeSet<String>,
        required: &[String],
    ) -> Self {
        if !is_valid {
            return Self::rejected("token is not valid");
        }

        let missing: Vec<&str> = required
            .iter()
            .filter(|scope| !granted.contains(scope.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Self::rejected(format!("missing scopes: {}", missing.join(",")));
        }

        match user_id.filter(|id| !id.is_empty()) {
            Some(user_id) => Self {
                valid: true,
                user_id: Some(user_id),
                scopes: granted,
                reason: None,
            },
            None => Self::rejected("response has no user id"),
        }
    }
}

/// プラットフォームAPIが返した未加工の投稿
pub type RawPost = serde_json::Value;

/// 正規化済み投稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedPost {
    Facebook(FacebookPost),
    Tweet(Tweet),
    /// 正規化未対応のプロバイダー（Instagram）はそのまま運ぶ
    Passthrough(serde_json::Value),
}

impl NormalizedPost {
    pub fn id(&self) -> &str {
        match self {
            NormalizedPost::Facebook(post) => &post.id,
            NormalizedPost::Tweet(tweet) => &tweet.id,
            NormalizedPost::Passthrough(value) => {
                value.get("id").and_then(|v| v.as_str()).unwrap_or_default()
            }
        }
    }
}

/// 転送バッチのメタ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMeta {
    pub result_count: usize,
    pub newest_id: String,
    pub oldest_id: String,
}

impl BatchMeta {
    /// 先頭が最新、末尾が最古（プラットフォームの既定順）
    pub fn from_posts(posts: &[NormalizedPost]) -> Self {
        Self {
            result_count: posts.len(),
            newest_id: posts.first().map(|p| p.id().to_string()).unwrap_or_default(),
            oldest_id: posts.last().map(|p| p.id().to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForwardPayload {
    pub data: Vec<NormalizedPost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BatchMeta>,
}

/// パーサーサービスへ送る単位
#[derive(Debug, Clone, Serialize)]
pub struct ForwardEnvelope {
    pub platform: Provider,
    pub payload: ForwardPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ForwardEnvelope {
    /// meta が無ければ投稿から生成する
    pub fn new(
        platform: Provider,
        data: Vec<NormalizedPost>,
        meta: Option<BatchMeta>,
        token: Option<String>,
    ) -> Self {
        let meta = meta.unwrap_or_else(|| BatchMeta::from_posts(&data));
        Self {
            platform,
            payload: ForwardPayload {
                data,
                meta: Some(meta),
            },
            token,
        }
    }
}
