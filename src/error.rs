use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("認証エラー: {0}")]
    Authentication(String),

    #[error("ユーザー識別エラー: {0}")]
    IdentityResolution(String),

    #[error("不正なリクエスト: {0}")]
    InvalidRequest(String),

    #[error("認証されていません")]
    NotAuthenticated,

    #[error("不正な状態遷移: {operation} は {state} 状態では実行できません")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("HTTPエラー: {0}")]
    Http(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("不正なレスポンス: {0}")]
    InvalidResponse(String),

    #[error("転送エラー: {0}")]
    Forward(String),

    #[error("未対応のプロバイダー: {0}")]
    UnknownProvider(String),

    #[error("設定エラー: {0}")]
    Config(String),
}

/// 呼び出し側に公開するエラー種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Scraper,
    Configuration,
}

impl ErrorKind {
    /// レスポンスの `error_type` に入る名前
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Scraper => "ScraperError",
            ErrorKind::Configuration => "ConfigurationError",
        }
    }
}

impl ScraperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::Authentication(_) | ScraperError::IdentityResolution(_) => {
                ErrorKind::Authentication
            }
            ScraperError::UnknownProvider(_) | ScraperError::Config(_) => ErrorKind::Configuration,
            ScraperError::InvalidRequest(_)
            | ScraperError::NotAuthenticated
            | ScraperError::InvalidState { .. }
            | ScraperError::Http(_)
            | ScraperError::Timeout(_)
            | ScraperError::InvalidResponse(_)
            | ScraperError::Forward(_) => ErrorKind::Scraper,
        }
    }

    /// 受付側HTTPレイヤーでのステータスコード
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Authentication => 401,
            ErrorKind::Scraper => 400,
            ErrorKind::Configuration => 500,
        }
    }
}

// reqwest のエラー表示にはクエリ文字列（トークン）を含むURLが入るため除去する
impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ScraperError::Timeout(err.to_string())
        } else {
            ScraperError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ScraperError {
    fn from(err: serde_json::Error) -> Self {
        ScraperError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(ScraperError::Authentication("expired".into()).status_code(), 401);
        assert_eq!(ScraperError::IdentityResolution("403".into()).status_code(), 401);
        assert_eq!(ScraperError::NotAuthenticated.status_code(), 400);
        assert_eq!(ScraperError::InvalidRequest("no tokens".into()).status_code(), 400);
        assert_eq!(ScraperError::Forward("refused".into()).status_code(), 400);
        assert_eq!(ScraperError::UnknownProvider("myspace".into()).status_code(), 500);
    }

    #[test]
    fn test_error_type_names() {
        assert_eq!(
            ScraperError::Timeout("fetch".into()).kind().as_str(),
            "ScraperError"
        );
        assert_eq!(
            ScraperError::Authentication("x".into()).kind().as_str(),
            "AuthenticationError"
        );
        assert_eq!(
            ScraperError::Config("x".into()).kind().as_str(),
            "ConfigurationError"
        );
    }

    #[test]
    fn test_json_error_is_invalid_response() {
        let err: ScraperError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, ScraperError::InvalidResponse(_)));
    }
}
