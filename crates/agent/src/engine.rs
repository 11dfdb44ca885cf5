//! The chat engine: one orchestrator for every domain.
//!
//! Per request the engine loads history, resolves the domain (pinned or
//! classified), runs retrieve→generate, and appends the user and assistant
//! turns. Retrieval always hands off to generation even when degraded;
//! generation always answers, absorbing backend failures as alert
//! components. Hard errors are reserved for orchestration invariants.
//!
//! Concurrent requests against the same session race on read-then-append;
//! the history ends up last-write-wins ordered. Accepted, not serialized.

use std::sync::Arc;

use amparo_core::{
    CompletionBackend, ConversationTurn, DomainId, DomainRegistry, EngineError, KnowledgeStore,
    PassageIndex, SessionId, StructuredResponse,
};
use amparo_sessions::SessionManager;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::classifier::classify;
use crate::context::ContextAssembler;
use crate::generator::ResponseGenerator;

/// The result of one single-shot request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: StructuredResponse,
    pub domain: DomainId,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
}

/// The orchestration pipeline, wired once at startup.
pub struct ChatEngine {
    registry: Arc<DomainRegistry>,
    assembler: ContextAssembler,
    generator: ResponseGenerator,
    sessions: SessionManager,
}

impl ChatEngine {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        registry: Arc<DomainRegistry>,
        knowledge: Arc<dyn KnowledgeStore>,
        index: Arc<dyn PassageIndex>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            registry,
            assembler: ContextAssembler::new(knowledge, index),
            generator: ResponseGenerator::new(backend),
            sessions,
        }
    }

    /// Override how many passages retrieval requests per query.
    pub fn with_search_top_k(mut self, top_k: usize) -> Self {
        self.assembler = self.assembler.with_top_k(top_k);
        self
    }

    /// The active completion backend's name.
    pub fn backend_name(&self) -> &str {
        self.generator.backend_name()
    }

    /// The session manager this engine appends through.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Resolve the request's domain: validate a pinned domain against the
    /// current catalog, or classify the message.
    pub async fn resolve_domain(
        &self,
        message: &str,
        pinned: Option<&DomainId>,
    ) -> Result<DomainId, EngineError> {
        let catalog = self.registry.snapshot().await;
        match pinned {
            Some(domain) if catalog.contains(domain) => Ok(domain.clone()),
            Some(domain) => Err(EngineError::UnknownDomain(domain.to_string())),
            None => Ok(classify(&catalog, message)),
        }
    }

    /// Run a single-shot request end to end.
    pub async fn process(
        &self,
        message: &str,
        session_id: &SessionId,
        pinned: Option<&DomainId>,
    ) -> Result<ChatOutcome, EngineError> {
        let domain = self.resolve_domain(message, pinned).await?;
        let response = self.run_pipeline(message, session_id, &domain).await?;

        Ok(ChatOutcome {
            response,
            domain,
            session_id: session_id.clone(),
            timestamp: Utc::now(),
        })
    }

    /// The shared retrieve→generate pass behind both execution modes.
    pub(crate) async fn run_pipeline(
        &self,
        message: &str,
        session_id: &SessionId,
        domain: &DomainId,
    ) -> Result<StructuredResponse, EngineError> {
        info!(domain = %domain, session = %session_id, "Processing message");

        let history = self.sessions.history(session_id).await;

        let catalog = self.registry.snapshot().await;
        let profile = catalog
            .get(domain)
            .ok_or_else(|| EngineError::Invariant(format!("domain {domain} missing from catalog")))?;

        // ── Retrieve: assemble grounded context ──
        let context = self.assembler.assemble(profile, message).await;

        // ── Generate: structured completion, failures absorbed ──
        let response = self.generator.generate(profile, message, &context, &history).await;

        let serialized = serde_json::to_string(&response)
            .map_err(|e| EngineError::Invariant(format!("response serialization failed: {e}")))?;

        self.sessions
            .append(session_id, ConversationTurn::user(message))
            .await;
        self.sessions
            .append(session_id, ConversationTurn::assistant(serialized))
            .await;

        Ok(response)
    }
}
