//! Ollama completion backend.
//!
//! Talks to the native `/api/chat` endpoint, which Ollama Cloud and local
//! Ollama servers share. No internal retry: this backend is already the
//! last resort, so failures surface immediately.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use amparo_core::completion::{ChatMessage, CompletionBackend};
use amparo_core::error::CompletionError;

use crate::{COMPLETION_TEMPERATURE, http_client};

/// The Ollama chat backend.
pub struct OllamaBackend {
    api_key: String,
    host: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(
        api_key: impl Into<String>,
        host: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: http_client(),
        }
    }

    fn build_body(&self, messages: &[ChatMessage], structured: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": COMPLETION_TEMPERATURE },
        });

        if structured {
            body["format"] = serde_json::json!("json");
        }

        body
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> std::result::Result<String, CompletionError> {
        let url = format!("{}/api/chat", self.host);
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

        Ok(api_response.message.content)
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed_from_host() {
        let backend = OllamaBackend::new("local", "https://ollama.com/", "gpt-oss:120b");
        assert_eq!(backend.host, "https://ollama.com");
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn structured_request_carries_json_format() {
        let backend = OllamaBackend::new("local", "https://ollama.com", "gpt-oss:120b");
        let body = backend.build_body(&[ChatMessage::user("hola")], true);

        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.1);
    }

    #[test]
    fn plain_request_omits_format() {
        let backend = OllamaBackend::new("local", "https://ollama.com", "gpt-oss:120b");
        let body = backend.build_body(&[ChatMessage::user("hola")], false);
        assert!(body.get("format").is_none());
    }

    #[test]
    fn parse_chat_response() {
        let data = r#"{
            "model": "gpt-oss:120b",
            "message": {"role": "assistant", "content": "{\"components\":[]}"},
            "done": true
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.message.content, r#"{"components":[]}"#);
    }
}
