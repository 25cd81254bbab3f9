//! reqwest-backed transport against the assistant backend

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::conversation::ConversationMessage;

use super::{
    classify_chat_response, extract_detail, fallback_detail, ChatError, ChatReply, ChatTransport,
    IngestError,
};

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
    conversation_history: &'a [ConversationMessage],
}

#[derive(Debug, Serialize)]
struct IngestRequest<'a> {
    url: &'a str,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe used by the status popup. Any successful response from
    /// `/docs` counts as connected.
    pub async fn check_status(&self) -> bool {
        match self
            .client
            .get(format!("{}/docs", self.base_url))
            .send()
            .await
        {
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Status probe answered");
                response.status().is_success()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Status probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_chat(
        &self,
        question: &str,
        history: &[ConversationMessage],
    ) -> Result<ChatReply, ChatError> {
        let request = ChatRequest {
            question,
            conversation_history: history,
        };

        tracing::debug!(history_len = history.len(), "Sending chat request");

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Chat request failed to send");
                ChatError::NetworkFailure(e.to_string())
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read chat response body");
            ChatError::NetworkFailure(e.to_string())
        })?;

        classify_chat_response(status, content_type.as_deref(), &body)
    }

    async fn ingest_page(&self, url: &str) -> Result<(), IngestError> {
        let response = self
            .client
            .post(format!("{}/process-documentation", self.base_url))
            .json(&IngestRequest { url })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %url, "Error processing page");
                IngestError::new("the assistant backend could not be reached")
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(extract_detail)
                .unwrap_or_else(|| fallback_detail(status));
            tracing::error!(status = status.as_u16(), %detail, %url, "Page ingestion rejected");
            return Err(IngestError::new(detail));
        }

        tracing::info!(%url, "Page processed");
        tracing::debug!(%body, "Ingestion response");
        Ok(())
    }
}
