//! Error types for the Amparo domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Amparo operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion backend errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Knowledge corpus errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Session store errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Orchestration invariant errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to a language-model completion backend.
///
/// These are absorbed by the response generator (rendered as an alert
/// component), never surfaced raw to an end user.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed backend response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Whether a bounded retry against the same backend is worth attempting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Failures of the knowledge corpus store or the passage index.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read corpus file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to parse corpus file {path}: {reason}")]
    FileParse { path: String, reason: String },

    #[error("Passage search failed: {0}")]
    SearchFailed(String),
}

/// Failures of the session persistence layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Corrupt session record for {session_id}: {reason}")]
    Corrupt { session_id: String, reason: String },
}

/// Orchestration-invariant violations.
///
/// Unlike backend failures these are not masked as a structured answer; the
/// transport layer maps them to hard errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Orchestration invariant violated: {0}")]
    Invariant(String),
}
