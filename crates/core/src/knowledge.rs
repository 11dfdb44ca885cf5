//! Knowledge collaborator traits: the corpus store and the passage index.
//!
//! The corpus store answers structured questions about the knowledge file
//! (per-domain context, routing keywords, FAQ lookup). The passage index is
//! the ranked free-text search the assembler queries per request; it is the
//! seam where an external vector search service would plug in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainId;
use crate::error::KnowledgeError;

/// A ranked passage returned by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// The passage text
    pub text: String,

    /// Document kind (e.g. "informacion", "tramite")
    pub kind: String,

    /// Corpus section the passage came from
    pub section: String,
}

/// A frequently-asked-question hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// The knowledge corpus store.
///
/// Accessors read an immutable in-memory snapshot and never fail; `reload`
/// re-reads the backing file and swaps the snapshot, keeping the old one on
/// failure.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Static context block for a domain; empty when nothing is known.
    async fn context_for(&self, domain: &DomainId) -> String;

    /// Routing keywords for a domain, lower-cased and deduplicated; empty
    /// for unknown domains.
    async fn keywords_for(&self, domain: &DomainId) -> Vec<String>;

    /// FAQ entries whose question or body contains `query`
    /// case-insensitively, in corpus order.
    async fn search_faqs(&self, domain: &DomainId, query: &str) -> Vec<FaqEntry>;

    /// Re-read the corpus file. Returns the new document count; on failure
    /// the previous snapshot keeps serving.
    async fn reload(&self) -> std::result::Result<usize, KnowledgeError>;

    /// Documents in the current snapshot.
    async fn document_count(&self) -> usize;
}

/// Ranked free-text search over the corpus.
#[async_trait]
pub trait PassageIndex: Send + Sync {
    /// Top `k` passages relevant to `query`, best first. May be empty.
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<Passage>, KnowledgeError>;
}
