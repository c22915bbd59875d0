//! 正規化済みデータをパーサーサービスへ転送

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::ScraperError;
use crate::traits::Forwarder;
use crate::types::ForwardEnvelope;

/// `POST {PARSER_URL}` へ送信する転送先
pub struct HttpForwarder {
    client: reqwest::Client,
    url: String,
}

impl HttpForwarder {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

/// パーサーのレスポンスを解釈（JSONでなければエラーオブジェクトを返す）
pub(crate) fn interpret_response(status: u16, body: &str) -> Result<Value, ScraperError> {
    if !(200..300).contains(&status) {
        return Err(ScraperError::Forward(format!(
            "parser returned status {}: {}",
            status, body
        )));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(status, error = %e, "Parser response is not JSON");
            Ok(json!({
                "error": "Invalid JSON response from parser",
                "status_code": status,
                "body": body,
            }))
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, envelope: &ForwardEnvelope) -> Result<Value, ScraperError> {
        let timeout = envelope.platform.forward_timeout();
        debug!(url = %self.url, platform = %envelope.platform, ?timeout, "Posting envelope");

        let resp = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    ScraperError::Timeout(format!("forward to parser: {}", e))
                } else {
                    ScraperError::Forward(e.to_string())
                }
            })?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ScraperError::Forward(e.without_url().to_string()))?;

        let result = interpret_response(status, &body)?;
        info!(platform = %envelope.platform, status, "Forwarded to parser");
        Ok(result)
    }
}
