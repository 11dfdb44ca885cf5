//! JSON corpus store.
//!
//! The corpus is a flat list of tagged documents. Institutional data lives
//! in the `institucional` and `contacto` sections; per-domain documents
//! carry the domain's tag; FAQ documents have kind `pregunta_respuesta`.
//! The whole file is held as one immutable snapshot behind a lock so a
//! reload swaps it atomically under readers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use amparo_config::DomainConfig;
use amparo_core::domain::{DomainId, DEFAULT_DOMAIN};
use amparo_core::error::KnowledgeError;
use amparo_core::knowledge::{FaqEntry, KnowledgeStore};

/// One corpus document. Field names follow the corpus file, which is
/// maintained in Spanish by the institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "titulo")]
    pub title: String,

    #[serde(rename = "contenido")]
    pub body: String,

    /// "informacion", "tramite", or "pregunta_respuesta"
    #[serde(rename = "tipo", default = "default_kind")]
    pub kind: String,

    #[serde(rename = "seccion", default)]
    pub section: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_kind() -> String {
    "informacion".into()
}

const FAQ_KIND: &str = "pregunta_respuesta";

/// The parsed corpus file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CorpusData {
    #[serde(default)]
    pub(crate) documents: Vec<Document>,
}

impl CorpusData {
    fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Document> {
        self.documents
            .iter()
            .filter(move |doc| doc.tags.iter().any(|t| t == tag))
    }

    fn in_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a Document> {
        self.documents
            .iter()
            .filter(move |doc| doc.section == section)
    }
}

/// File-backed corpus store with atomic snapshot reload.
pub struct CorpusStore {
    path: PathBuf,
    /// Domain id to corpus tag; ids absent here fall back to the id itself
    tags: BTreeMap<DomainId, String>,
    current: RwLock<Arc<CorpusData>>,
}

impl CorpusStore {
    /// Load the corpus file. A missing file starts an empty corpus with a
    /// warning; a malformed file does the same with an error log, so a bad
    /// deploy degrades to "no knowledge" instead of refusing to start.
    pub fn open(path: impl Into<PathBuf>, domains: &[DomainConfig]) -> Self {
        let path = path.into();
        let tags = domains
            .iter()
            .map(|d| (DomainId::from(&d.id), d.tag().to_string()))
            .collect();

        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CorpusData>(&content) {
                Ok(data) => {
                    info!(path = %path.display(), documents = data.documents.len(), "Knowledge corpus loaded");
                    data
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Corpus file is malformed, starting empty");
                    CorpusData::default()
                }
            },
            Err(_) => {
                warn!(path = %path.display(), "Corpus file not found, starting empty");
                CorpusData::default()
            }
        };

        Self {
            path,
            tags,
            current: RwLock::new(Arc::new(data)),
        }
    }

    /// The corpus as of this instant.
    pub(crate) async fn snapshot(&self) -> Arc<CorpusData> {
        self.current.read().await.clone()
    }

    fn tag_for<'a>(&'a self, domain: &'a DomainId) -> &'a str {
        self.tags
            .get(domain)
            .map(String::as_str)
            .unwrap_or_else(|| domain.as_str())
    }

    fn general_context(data: &CorpusData) -> String {
        data.in_section("institucional")
            .chain(data.in_section("contacto"))
            .map(|doc| format!("{}: {}", doc.title, doc.body))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn domain_context(data: &CorpusData, domain: &DomainId, tag: &str) -> String {
        let docs: Vec<&Document> = data.with_tag(tag).collect();
        let Some(first) = docs.first() else {
            return String::new();
        };

        let mut lines = vec![format!("Contexto para fuero {domain}:")];
        lines.push(format!("Descripción: {}", first.body));
        for doc in &docs {
            lines.push(format!("- {}: {}", doc.title, doc.body));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl KnowledgeStore for CorpusStore {
    async fn context_for(&self, domain: &DomainId) -> String {
        let data = self.snapshot().await;
        if domain.as_str() == DEFAULT_DOMAIN {
            Self::general_context(&data)
        } else {
            Self::domain_context(&data, domain, self.tag_for(domain))
        }
    }

    async fn keywords_for(&self, domain: &DomainId) -> Vec<String> {
        let data = self.snapshot().await;
        let tag = self.tag_for(domain);
        let keywords: BTreeSet<String> = data
            .with_tag(tag)
            .flat_map(|doc| doc.tags.iter())
            .map(|t| t.to_lowercase())
            .collect();
        keywords.into_iter().collect()
    }

    async fn search_faqs(&self, domain: &DomainId, query: &str) -> Vec<FaqEntry> {
        let data = self.snapshot().await;
        let query_lower = query.to_lowercase();

        let hits: Vec<FaqEntry> = data
            .documents
            .iter()
            .filter(|doc| doc.kind == FAQ_KIND)
            .filter(|doc| {
                doc.title.to_lowercase().contains(&query_lower)
                    || doc.body.to_lowercase().contains(&query_lower)
            })
            .map(|doc| FaqEntry {
                question: doc.title.clone(),
                answer: doc.body.clone(),
            })
            .collect();

        debug!(domain = %domain, hits = hits.len(), "FAQ scan");
        hits
    }

    async fn reload(&self) -> Result<usize, KnowledgeError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            KnowledgeError::FileRead {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let data: CorpusData =
            serde_json::from_str(&content).map_err(|e| KnowledgeError::FileParse {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let count = data.documents.len();
        let mut guard = self.current.write().await;
        *guard = Arc::new(data);
        info!(documents = count, "Knowledge corpus reloaded");
        Ok(count)
    }

    async fn document_count(&self) -> usize {
        self.snapshot().await.documents.len()
    }
}
