//! Session manager: store selection and failure absorption.
//!
//! Chooses the durable store at startup (opening it doubles as the
//! probe) and wraps whichever store won behind an error-absorbing
//! surface. A broken session layer must degrade to stateless
//! conversations; it must never fail a chat request.

use std::sync::Arc;

use tracing::{info, warn};

use amparo_config::SessionConfig;
use amparo_core::message::{ConversationTurn, SessionId};
use amparo_core::session::SessionStore;

use crate::local::LocalSessionStore;
use crate::sqlite::SqliteSessionStore;

/// Shared handle to the active session store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Open the SQLite store; on failure, log and fall back to the
    /// process-local store.
    pub async fn connect(config: &SessionConfig) -> Self {
        match SqliteSessionStore::new(&config.db_path, config.ttl_secs).await {
            Ok(store) => {
                info!(path = %config.db_path, ttl_secs = config.ttl_secs, "Using SQLite session store");
                Self {
                    store: Arc::new(store),
                }
            }
            Err(e) => {
                warn!(error = %e, "SQLite session store unavailable, using process-local fallback");
                Self {
                    store: Arc::new(LocalSessionStore::new()),
                }
            }
        }
    }

    /// Wrap a specific store (useful for testing).
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The active store's name for health reporting.
    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Whether the active store expires sessions.
    pub fn supports_expiry(&self) -> bool {
        self.store.supports_expiry()
    }

    /// Session history; a store failure degrades to an empty history.
    pub async fn history(&self, session_id: &SessionId) -> Vec<ConversationTurn> {
        match self.store.history(session_id).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "History read failed, continuing without it");
                Vec::new()
            }
        }
    }

    /// Persist a turn; a store failure is logged and dropped.
    pub async fn append(&self, session_id: &SessionId, turn: ConversationTurn) {
        if let Err(e) = self.store.append(session_id, turn).await {
            warn!(session_id = %session_id, error = %e, "Failed to persist turn");
        }
    }

    /// Drop a session; a store failure is logged and dropped.
    pub async fn clear(&self, session_id: &SessionId) {
        if let Err(e) = self.store.clear(session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to clear session");
        }
    }

    /// Live session count, zero when the store cannot answer.
    pub async fn session_count(&self) -> usize {
        self.store.session_count().await.unwrap_or(0)
    }
}
