//! In-process lexical passage index.
//!
//! Scores term overlap between the query and each document of the current
//! corpus snapshot. Deliberately simple: the `PassageIndex` trait is where
//! an external vector search service would plug in, and the pipeline
//! already tolerates the index erroring or returning nothing.

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use amparo_core::error::KnowledgeError;
use amparo_core::knowledge::{Passage, PassageIndex};

use crate::corpus::{CorpusStore, Document};

/// Terms shorter than this are dropped before scoring; in Spanish they are
/// almost always articles and prepositions.
const MIN_TERM_CHARS: usize = 3;

const TITLE_WEIGHT: u32 = 2;
const BODY_WEIGHT: u32 = 1;

/// Lexical index over the shared corpus store.
pub struct CorpusIndex {
    store: Arc<CorpusStore>,
}

impl CorpusIndex {
    pub fn new(store: Arc<CorpusStore>) -> Self {
        Self { store }
    }

    fn score(doc: &Document, terms: &[String]) -> u32 {
        let title = doc.title.to_lowercase();
        let body = doc.body.to_lowercase();

        let mut score = 0;
        for term in terms {
            if title.contains(term.as_str()) {
                score += TITLE_WEIGHT;
            }
            if body.contains(term.as_str()) {
                score += BODY_WEIGHT;
            }
        }
        score
    }

    fn render(doc: &Document) -> Passage {
        Passage {
            text: format!(
                "Título: {}\nSección: {}\nContenido: {}",
                doc.title, doc.section, doc.body
            ),
            kind: doc.kind.clone(),
            section: doc.section.clone(),
        }
    }
}

#[async_trait]
impl PassageIndex for CorpusIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, KnowledgeError> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
            .map(str::to_string)
            .collect();

        if terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let data = self.store.snapshot().await;
        let mut scored: Vec<(u32, &Document)> = data
            .documents
            .iter()
            .map(|doc| (Self::score(doc, &terms), doc))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps corpus order among equal scores.
        scored.sort_by_key(|(score, _)| Reverse(*score));
        scored.truncate(k);

        debug!(terms = terms.len(), hits = scored.len(), "Passage search");
        Ok(scored.into_iter().map(|(_, doc)| Self::render(doc)).collect())
    }
}
