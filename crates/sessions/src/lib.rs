//! Session persistence for Amparo.
//!
//! Two stores implement `amparo_core::SessionStore`: a durable SQLite
//! store that honors the session TTL, and a process-local fallback for
//! when the database cannot be opened. [`SessionManager`] picks one at
//! startup and absorbs store failures so a broken session layer degrades
//! to stateless conversations instead of failed requests.

pub mod local;
pub mod manager;
pub mod sqlite;

pub use local::LocalSessionStore;
pub use manager::SessionManager;
pub use sqlite::SqliteSessionStore;
