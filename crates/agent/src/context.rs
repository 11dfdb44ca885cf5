//! Grounded context assembly.
//!
//! One request's context is built additively from three sources: the
//! domain's static context, ranked passages from the index, and FAQ
//! substring hits. Retrieval degradation never aborts the pipeline; a
//! failed search is logged and the remaining sources still contribute.

use std::sync::Arc;

use amparo_core::{DomainProfile, KnowledgeStore, PassageIndex};
use tracing::{debug, error};

/// Passages requested from the index per query unless overridden.
pub const DEFAULT_TOP_K: usize = 3;

/// Builds the prompt-ready context blob for one request.
pub struct ContextAssembler {
    knowledge: Arc<dyn KnowledgeStore>,
    index: Arc<dyn PassageIndex>,
    top_k: usize,
}

impl ContextAssembler {
    pub fn new(knowledge: Arc<dyn KnowledgeStore>, index: Arc<dyn PassageIndex>) -> Self {
        Self {
            knowledge,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override how many passages are requested from the index.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Assemble the context for a domain and query.
    ///
    /// The static context comes from the catalog profile so a request reads
    /// one consistent snapshot; passages and FAQs are fetched live. Always
    /// returns a valid string, possibly empty.
    pub async fn assemble(&self, profile: &DomainProfile, query: &str) -> String {
        let mut context = profile.context.clone();

        match self.index.search(query, self.top_k).await {
            Ok(passages) if !passages.is_empty() => {
                context.push_str("\n\nINFORMACIÓN EXTRAÍDA DE LA BASE DE CONOCIMIENTO:\n");
                for passage in &passages {
                    context.push_str(&format!(
                        "--- [Tipo: {} | Sección: {}] ---\n",
                        passage.kind, passage.section
                    ));
                    context.push_str(&passage.text);
                    context.push('\n');
                }
                debug!(domain = %profile.id, passages = passages.len(), "Passages added to context");
            }
            Ok(_) => {}
            Err(e) => {
                error!(domain = %profile.id, error = %e, "Passage search failed, continuing without passages");
            }
        }

        let faqs = self.knowledge.search_faqs(&profile.id, query).await;
        if !faqs.is_empty() {
            context.push_str("\n\nPreguntas Frecuentes Relacionadas:\n");
            for faq in &faqs {
                context.push_str(&format!("- P: {}\n  R: {}\n", faq.question, faq.answer));
            }
        }

        context
    }
}
