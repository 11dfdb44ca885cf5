//! Completion backend trait: the abstraction over language-model services.
//!
//! A backend receives a prompt as an ordered message list and returns raw
//! completion text. The generator asks for structured (JSON-constrained)
//! output; how a backend enforces that is its own business.
//!
//! Implementations: Groq (OpenAI-compatible), Ollama Cloud.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::message::{ConversationTurn, Role};

/// One message of a completion prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// The completion backend trait.
///
/// The pipeline calls `complete()` without knowing which service answers.
/// Errors are backend-shaped ([`CompletionError`]); the generator decides
/// what the user sees.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// A short name for logs and health reporting (e.g. "groq", "ollama").
    fn name(&self) -> &str;

    /// Send the prompt and return the raw completion text.
    ///
    /// With `structured` set, the backend must constrain its output to a
    /// single JSON object (every shipped backend supports a JSON mode).
    async fn complete(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> std::result::Result<String, CompletionError>;
}
