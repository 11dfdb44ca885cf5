//! Groq completion backend.
//!
//! Talks to Groq's OpenAI-compatible `/openai/v1/chat/completions`
//! endpoint. Transient failures (network, timeout, rate limit, 5xx) get a
//! bounded in-place retry before the error is handed to the caller.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use amparo_core::completion::{ChatMessage, CompletionBackend};
use amparo_core::error::CompletionError;

use crate::{COMPLETION_TEMPERATURE, http_client};

/// Re-attempts after a transient failure.
const MAX_RETRIES: u32 = 2;

/// Backoff between re-attempts, multiplied by the attempt number.
const RETRY_BACKOFF_MS: u64 = 300;

/// The Groq chat-completion backend.
pub struct GroqBackend {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GroqBackend {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: http_client(),
        }
    }

    fn build_body(&self, messages: &[ChatMessage], structured: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": COMPLETION_TEMPERATURE,
            "stream": false,
        });

        if structured {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    async fn request_once(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> std::result::Result<String, CompletionError> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let body = self.build_body(messages, structured);

        debug!(model = %self.model, structured, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(CompletionError::RateLimited { retry_after_secs: 5 });
        }

        if status == 401 || status == 403 {
            return Err(CompletionError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(CompletionError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            CompletionError::InvalidResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("No choices in response".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl CompletionBackend for GroqBackend {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> std::result::Result<String, CompletionError> {
        let mut attempt: u32 = 0;
        loop {
            match self.request_once(messages, structured).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Transient backend failure, retrying");
                    let backoff = RETRY_BACKOFF_MS * u64::from(attempt);
                    tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// --- Groq API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
