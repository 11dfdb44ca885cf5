//! Session store trait: bounded, ordered, expiring conversation history.
//!
//! Implementations: SQLite (durable, TTL honored) and process-local
//! (fallback, no expiry). Which one a process runs with is decided once at
//! startup; `supports_expiry` surfaces the difference instead of hiding it.

use async_trait::async_trait;

use crate::error::SessionError;
use crate::message::{ConversationTurn, SessionId};

/// Retained turns per session. Oldest beyond this are evicted on append.
/// Independent of the prompt history window, which is smaller.
pub const SESSION_TURN_CAP: usize = 20;

/// The session persistence trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name for logs and health reporting (e.g. "sqlite", "local").
    fn name(&self) -> &'static str;

    /// Whether sessions expire on their own. False for the local fallback,
    /// which keeps history until cleared or the process exits.
    fn supports_expiry(&self) -> bool;

    /// The session's turns in chronological order; empty for an unknown or
    /// expired session.
    async fn history(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Vec<ConversationTurn>, SessionError>;

    /// Append one turn, trim to [`SESSION_TURN_CAP`], refresh the TTL.
    async fn append(
        &self,
        session_id: &SessionId,
        turn: ConversationTurn,
    ) -> std::result::Result<(), SessionError>;

    /// Drop a session and all its turns.
    async fn clear(&self, session_id: &SessionId) -> std::result::Result<(), SessionError>;

    /// Live session count in this store.
    async fn session_count(&self) -> std::result::Result<usize, SessionError>;
}
