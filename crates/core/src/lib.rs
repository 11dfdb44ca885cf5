//! # Amparo Core
//!
//! Domain types, traits, and error definitions for the Amparo assistant
//! pipeline. This crate has **zero framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the orchestration pipeline is defined as a trait
//! here. Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod completion;
pub mod domain;
pub mod error;
pub mod event;
pub mod knowledge;
pub mod message;
pub mod response;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use completion::{ChatMessage, CompletionBackend};
pub use domain::{DomainCatalog, DomainId, DomainProfile, DomainRegistry, DEFAULT_DOMAIN};
pub use error::{CompletionError, EngineError, Error, KnowledgeError, Result, SessionError};
pub use event::PipelineEvent;
pub use knowledge::{FaqEntry, KnowledgeStore, Passage, PassageIndex};
pub use message::{ConversationTurn, Role, SessionId};
pub use response::{AlertLevel, ComponentKind, ResponseValidationError, StructuredResponse, UiComponent};
pub use session::{SessionStore, SESSION_TURN_CAP};
