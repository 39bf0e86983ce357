pub mod http;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use thiserror::Error;

pub use self::http::HttpChatBackend;

/// Body of the single outbound call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    /// Session token from the previous exchange, `null` on the first call.
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_content: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendReply {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendReply {
    /// Text to show: a non-empty `reply`, falling back to a non-empty `error`.
    pub fn display_text(&self) -> Option<&str> {
        fn non_empty(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|s| !s.is_empty())
        }
        non_empty(&self.reply).or_else(|| non_empty(&self.error))
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn exchange(&self, request: &ChatRequest) -> Result<BackendReply, BackendError>;

    fn endpoint(&self) -> String;
}
