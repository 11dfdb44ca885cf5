//! Process-local session store.
//!
//! The fallback when SQLite cannot be opened. History lives in a map
//! guarded by a `tokio::sync::RwLock` and disappears with the process.
//! Turns are capped like the durable store, but nothing expires.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use amparo_core::error::SessionError;
use amparo_core::message::{ConversationTurn, SessionId};
use amparo_core::session::{SESSION_TURN_CAP, SessionStore};

/// In-process session store.
#[derive(Default)]
pub struct LocalSessionStore {
    sessions: RwLock<HashMap<String, VecDeque<ConversationTurn>>>,
}

impl LocalSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn supports_expiry(&self) -> bool {
        false
    }

    async fn history(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Vec<ConversationTurn>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id.as_str())
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        session_id: &SessionId,
        turn: ConversationTurn,
    ) -> std::result::Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let turns = sessions.entry(session_id.as_str().to_string()).or_default();

        turns.push_back(turn);
        while turns.len() > SESSION_TURN_CAP {
            turns.pop_front();
        }

        Ok(())
    }

    async fn clear(&self, session_id: &SessionId) -> std::result::Result<(), SessionError> {
        self.sessions.write().await.remove(session_id.as_str());
        Ok(())
    }

    async fn session_count(&self) -> std::result::Result<usize, SessionError> {
        Ok(self.sessions.read().await.len())
    }
}
