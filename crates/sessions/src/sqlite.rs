//! Durable SQLite session store.
//!
//! One row per session: the turn list is a JSON array stored newest-first
//! and trimmed to the cap on every append, so a session row never grows
//! past a few kilobytes. `expires_at` is an RFC 3339 UTC timestamp at
//! second precision, which makes string comparison inside SQLite
//! chronological. Expired rows are invisible to reads and counts and are
//! swept opportunistically on writes.

use std::collections::VecDeque;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use amparo_core::error::SessionError;
use amparo_core::message::{ConversationTurn, SessionId};
use amparo_core::session::{SESSION_TURN_CAP, SessionStore};

/// The SQLite-backed session store.
pub struct SqliteSessionStore {
    pool: SqlitePool,
    ttl_secs: i64,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// For plain file paths the parent directory is created first. Pass
    /// `"sqlite::memory:"` for an in-process ephemeral database.
    pub async fn new(path: &str, ttl_secs: u64) -> Result<Self, SessionError> {
        if !path.contains(":memory:") {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        SessionError::Connection(format!(
                            "Failed to create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| SessionError::Connection(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| SessionError::Connection(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool, ttl_secs).await?;
        info!("SQLite session store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool, ttl_secs: u64) -> Result<Self, SessionError> {
        let store = Self {
            pool,
            ttl_secs: ttl_secs as i64,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                turns      TEXT NOT NULL DEFAULT '[]',
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("sessions table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("expires_at index: {e}")))?;

        debug!("Session store migrations complete");
        Ok(())
    }

    fn now_string() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn expiry_string(&self) -> String {
        (Utc::now() + chrono::Duration::seconds(self.ttl_secs))
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_expiry(&self) -> bool {
        true
    }

    async fn history(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Vec<ConversationTurn>, SessionError> {
        let row =
            sqlx::query("SELECT turns FROM sessions WHERE session_id = ?1 AND expires_at > ?2")
                .bind(session_id.as_str())
                .bind(Self::now_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| SessionError::Storage(format!("SELECT failed: {e}")))?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };

        let turns_json: String = row
            .try_get("turns")
            .map_err(|e| SessionError::Storage(format!("turns column: {e}")))?;

        let mut turns: Vec<ConversationTurn> =
            serde_json::from_str(&turns_json).map_err(|e| SessionError::Corrupt {
                session_id: session_id.as_str().to_string(),
                reason: e.to_string(),
            })?;

        // Stored newest-first; callers get chronological order.
        turns.reverse();
        Ok(turns)
    }

    async fn append(
        &self,
        session_id: &SessionId,
        turn: ConversationTurn,
    ) -> std::result::Result<(), SessionError> {
        let now = Self::now_string();

        // Opportunistic sweep. Also makes an append through an expired
        // session start from an empty turn list.
        let swept = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("Expiry sweep: {e}")))?;
        if swept.rows_affected() > 0 {
            debug!(swept = swept.rows_affected(), "Expired sessions removed");
        }

        let row = sqlx::query("SELECT turns FROM sessions WHERE session_id = ?1")
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("SELECT failed: {e}")))?;

        let mut turns: VecDeque<ConversationTurn> = match row {
            Some(row) => {
                let turns_json: String = row
                    .try_get("turns")
                    .map_err(|e| SessionError::Storage(format!("turns column: {e}")))?;
                match serde_json::from_str(&turns_json) {
                    Ok(turns) => turns,
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Corrupt turn list, starting fresh");
                        VecDeque::new()
                    }
                }
            }
            None => VecDeque::new(),
        };

        turns.push_front(turn);
        turns.truncate(SESSION_TURN_CAP);

        let turns_json = serde_json::to_string(&turns)
            .map_err(|e| SessionError::Storage(format!("Turn serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, turns, expires_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(session_id) DO UPDATE SET
                turns = excluded.turns,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(session_id.as_str())
        .bind(&turns_json)
        .bind(self.expiry_string())
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("UPSERT failed: {e}")))?;

        Ok(())
    }

    async fn clear(&self, session_id: &SessionId) -> std::result::Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?1")
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("DELETE failed: {e}")))?;

        debug!(session_id = %session_id, "Session cleared");
        Ok(())
    }

    async fn session_count(&self) -> std::result::Result<usize, SessionError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM sessions WHERE expires_at > ?1")
            .bind(Self::now_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("COUNT failed: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| SessionError::Storage(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }
}
