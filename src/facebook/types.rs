//! Facebook 関連の型定義

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 正規化済みのFacebook投稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacebookPost {
    pub id: String,
    pub created_time: String,
    pub permalink_url: String,
    pub attachments: AttachmentList,
    pub reactions: Reactions,
    pub comments: Comments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentList {
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    pub data: Vec<Value>,
    pub summary: ReactionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub total_count: i64,
    pub viewer_reaction: String,
}

impl Default for ReactionSummary {
    fn default() -> Self {
        Self {
            total_count: 0,
            viewer_reaction: "NONE".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comments {
    pub data: Vec<Value>,
    pub summary: CommentSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub order: String,
    pub total_count: i64,
    pub can_comment: bool,
}

impl Default for CommentSummary {
    fn default() -> Self {
        Self {
            order: "chronological".to_string(),
            total_count: 0,
            can_comment: true,
        }
    }
}

/// `GET /debug_token` のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct DebugTokenResponse {
    pub data: DebugTokenData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugTokenData {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}
