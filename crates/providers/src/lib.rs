//! Completion backend implementations for Amparo.
//!
//! Two backends ship: Groq over its OpenAI-compatible chat surface and
//! Ollama Cloud over its native chat API. Both implement
//! `amparo_core::CompletionBackend`. Selection happens once per process
//! in [`select_backend`]; there is no per-request failover.

pub mod groq;
pub mod ollama;

pub use groq::GroqBackend;
pub use ollama::OllamaBackend;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use amparo_config::AppConfig;
use amparo_core::completion::CompletionBackend;

/// Wall-clock budget for a single completion request.
pub const COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature for both backends. Low, because answers must stay
/// close to the injected institutional context.
pub(crate) const COMPLETION_TEMPERATURE: f64 = 0.1;

/// Which configured backend the process-level selection landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// Groq, chosen because an API key is configured
    Primary,
    /// Ollama Cloud, chosen because no Groq key is configured
    Fallback,
}

impl SelectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Pick the completion backend for this process.
///
/// Groq wins whenever a non-empty API key is configured; otherwise the
/// Ollama backend is built from its config section, which has usable
/// defaults for Ollama Cloud.
pub fn select_backend(config: &AppConfig) -> (Arc<dyn CompletionBackend>, SelectionKind) {
    match config.groq.api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            info!(model = %config.groq.model, "Selected Groq completion backend");
            let backend = GroqBackend::new(key, &config.groq.base_url, &config.groq.model);
            (Arc::new(backend), SelectionKind::Primary)
        }
        _ => {
            info!(
                model = %config.ollama.model,
                host = %config.ollama.host,
                "No Groq API key, selected Ollama completion backend"
            );
            let backend =
                OllamaBackend::new(&config.ollama.api_key, &config.ollama.host, &config.ollama.model);
            (Arc::new(backend), SelectionKind::Fallback)
        }
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(COMPLETION_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}
