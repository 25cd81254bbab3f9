//! Backend transport
//!
//! Wraps the two calls the widget makes against the assistant backend (chat
//! query and page ingestion) and turns every transport-level outcome into a
//! typed result. Nothing here retries or enforces its own timeout.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::conversation::ConversationMessage;

pub use http::HttpTransport;

/// A successful chat answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
}

/// Failures of a chat request.
///
/// The `Display` text is what the user sees in the chat bubble; diagnostic
/// detail is carried in the payload and only ever logged.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Error: could not reach the assistant backend. Is it running?")]
    NetworkFailure(String),

    #[error("Error: the server returned a non-JSON response.")]
    NonJsonResponse,

    #[error("Error: Server error: {0}")]
    ServerError(String),

    #[error("Error: the server returned an empty response.")]
    EmptyResponse,
}

/// Failure of the page ingestion call
#[derive(Debug, Clone, Error)]
#[error("Error: could not process this page: {detail}")]
pub struct IngestError {
    pub detail: String,
}

impl IngestError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// The backend as seen by the widget
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Ask a question, replaying `history` as context
    async fn send_chat(
        &self,
        question: &str,
        history: &[ConversationMessage],
    ) -> Result<ChatReply, ChatError>;

    /// Submit the current page URL for indexing
    async fn ingest_page(&self, url: &str) -> Result<(), IngestError>;
}

/// Classify a raw `/chat` response.
///
/// Order matters: the declared content type is checked before the status, so
/// an HTML error page from a proxy surfaces as `NonJsonResponse`.
pub(crate) fn classify_chat_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<ChatReply, ChatError> {
    if !is_json_content_type(content_type) {
        tracing::warn!(
            status = status.as_u16(),
            content_type = content_type.unwrap_or("<none>"),
            "Chat endpoint answered with a non-JSON content type"
        );
        return Err(ChatError::NonJsonResponse);
    }

    let parsed = serde_json::from_slice::<Value>(body);

    if !status.is_success() {
        let detail = parsed
            .as_ref()
            .ok()
            .and_then(extract_detail)
            .unwrap_or_else(|| fallback_detail(status));
        tracing::error!(status = status.as_u16(), %detail, "Chat request rejected by server");
        return Err(ChatError::ServerError(detail));
    }

    let value = parsed.map_err(|e| {
        tracing::warn!(error = %e, "Chat response declared JSON but did not parse");
        ChatError::NonJsonResponse
    })?;

    match value.get("response").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(ChatReply {
            response: text.to_string(),
        }),
        _ => {
            tracing::warn!(body = %value, "Chat response has no usable `response` field");
            Err(ChatError::EmptyResponse)
        }
    }
}

/// Pull the `detail` field out of an error body. Structured details are
/// stringified as compact JSON.
pub(crate) fn extract_detail(value: &Value) -> Option<String> {
    match value.get("detail")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn fallback_detail(status: StatusCode) -> String {
    format!("request failed with status {}", status.as_u16())
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(raw) = content_type else {
        return false;
    };
    let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
