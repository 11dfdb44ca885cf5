//! Structured response generation.
//!
//! Builds the prompt (system message + bounded history + query), asks the
//! backend for schema-constrained output, and validates the result. Backend
//! and format failures are absorbed here: the generator always returns a
//! well-formed [`StructuredResponse`], never an error.

use std::sync::Arc;

use amparo_core::{
    AlertLevel, ChatMessage, CompletionBackend, ConversationTurn, DomainProfile,
    StructuredResponse, UiComponent,
};
use tracing::{error, warn};

use crate::prompt;

/// Most recent turns folded into the prompt. Independent of the session
/// retention cap, which is larger.
pub const HISTORY_WINDOW: usize = 10;

/// Alert shown when the model output fails schema validation.
const FORMAT_ERROR_TEXT: &str = "Error al procesar formato de respuesta.";

/// Alert shown when the backend call itself fails.
const CALL_ERROR_TEXT: &str = "Error técnico temporal al generar respuesta. \
     Por favor, intenta nuevamente en unos momentos o contacta a la Defensa \
     Pública al 0800-555-JUSTICIA.";

/// Turns a prompt into a validated structured answer.
pub struct ResponseGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// The active backend's name, for logs and health reporting.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate the structured answer for one request.
    ///
    /// Call failures become a single alert; malformed output becomes an
    /// alert plus the raw text. Either way the caller gets a valid response.
    pub async fn generate(
        &self,
        profile: &DomainProfile,
        query: &str,
        context: &str,
        history: &[ConversationTurn],
    ) -> StructuredResponse {
        let messages = build_messages(profile, query, context, history);

        match self.backend.complete(&messages, true).await {
            Ok(raw) => parse_response(&raw),
            Err(e) => {
                error!(backend = self.backend.name(), error = %e, "Completion call failed");
                StructuredResponse::new(vec![UiComponent::alert(CALL_ERROR_TEXT, AlertLevel::Error)])
            }
        }
    }
}

/// System message, then the most recent [`HISTORY_WINDOW`] turns in
/// chronological order, then the current query.
fn build_messages(
    profile: &DomainProfile,
    query: &str,
    context: &str,
    history: &[ConversationTurn],
) -> Vec<ChatMessage> {
    let window_start = history.len().saturating_sub(HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(history.len() - window_start + 2);
    messages.push(ChatMessage::system(prompt::system_prompt(profile, context)));
    for turn in &history[window_start..] {
        messages.push(ChatMessage::from(turn));
    }
    messages.push(ChatMessage::user(query));
    messages
}

fn parse_response(raw: &str) -> StructuredResponse {
    let response = match serde_json::from_str::<StructuredResponse>(raw) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Model output is not valid JSON");
            return format_error_fallback(raw);
        }
    };

    match response.validate() {
        Ok(()) => response,
        Err(e) => {
            warn!(error = %e, "Model output failed response validation");
            format_error_fallback(raw)
        }
    }
}

/// Alert plus the raw payload so the answer is never lost. A blank payload
/// would violate the non-empty-content invariant, so it is dropped.
fn format_error_fallback(raw: &str) -> StructuredResponse {
    let mut components = vec![UiComponent::alert(FORMAT_ERROR_TEXT, AlertLevel::Error)];
    if !raw.trim().is_empty() {
        components.push(UiComponent::text(raw));
    }
    StructuredResponse::new(components)
}
