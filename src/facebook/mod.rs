//! Facebook Graph API スクレイパーモジュール
//!
//! debug_token でトークンを検証し、`/{user_id}/posts` から投稿を取得する

mod normalize;
mod platform;
mod types;

pub use normalize::{normalize_post, normalize_posts};
pub use platform::FacebookPlatform;
pub use types::{
    AttachmentList, CommentSummary, Comments, DebugTokenData, DebugTokenResponse, FacebookPost,
    ReactionSummary, Reactions,
};
