//! Shared test fixtures for the pipeline tests.

use std::sync::{Arc, Mutex};

use amparo_core::{
    ChatMessage, CompletionBackend, CompletionError, DomainCatalog, DomainId, DomainProfile,
    DomainRegistry, FaqEntry, KnowledgeError, KnowledgeStore, Passage, PassageIndex,
};
use amparo_sessions::{LocalSessionStore, SessionManager};
use async_trait::async_trait;

use crate::engine::ChatEngine;

/// A completion backend that returns scripted results in order and records
/// every call. Panics when called more times than scripted.
pub struct ScriptedBackend {
    script: Mutex<Vec<Result<String, CompletionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub structured: bool,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// One successful completion.
    pub fn single(raw: &str) -> Self {
        Self::new(vec![Ok(raw.to_string())])
    }

    /// One failing completion.
    pub fn failing(error: CompletionError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The most recent call's prompt and mode.
    pub fn last_call(&self) -> RecordedCall {
        self.calls
            .lock()
            .unwrap()
            .last()
            .expect("ScriptedBackend: no calls recorded")
            .clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            structured,
        });

        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!("ScriptedBackend: no scripted responses left");
        }
        script.remove(0)
    }
}

/// Knowledge store stub: fixed FAQ list, no corpus behind it.
#[derive(Default)]
pub struct StubKnowledge {
    faqs: Vec<FaqEntry>,
}

impl StubKnowledge {
    pub fn with_faqs(faqs: Vec<FaqEntry>) -> Self {
        Self { faqs }
    }
}

#[async_trait]
impl KnowledgeStore for StubKnowledge {
    async fn context_for(&self, _domain: &DomainId) -> String {
        String::new()
    }

    async fn keywords_for(&self, _domain: &DomainId) -> Vec<String> {
        Vec::new()
    }

    async fn search_faqs(&self, _domain: &DomainId, _query: &str) -> Vec<FaqEntry> {
        self.faqs.clone()
    }

    async fn reload(&self) -> Result<usize, KnowledgeError> {
        Ok(0)
    }

    async fn document_count(&self) -> usize {
        0
    }
}

/// Passage index stub returning a fixed list and recording the requested k.
pub struct StubIndex {
    passages: Vec<Passage>,
    last_k: Mutex<Option<usize>>,
}

impl StubIndex {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            last_k: Mutex::new(None),
        }
    }

    pub fn last_k(&self) -> Option<usize> {
        *self.last_k.lock().unwrap()
    }
}

#[async_trait]
impl PassageIndex for StubIndex {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Passage>, KnowledgeError> {
        *self.last_k.lock().unwrap() = Some(k);
        Ok(self.passages.clone())
    }
}

/// Index that always fails, for degraded-retrieval tests.
pub struct FailingIndex;

#[async_trait]
impl PassageIndex for FailingIndex {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<Passage>, KnowledgeError> {
        Err(KnowledgeError::SearchFailed("index offline".into()))
    }
}

pub fn profile(id: &str, keywords: &[&str], context: &str) -> DomainProfile {
    DomainProfile {
        id: DomainId::from(id),
        title: id.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        context: context.to_string(),
        guidance: String::new(),
    }
}

/// Three domains covering the routing cases the tests exercise.
pub fn test_catalog() -> DomainCatalog {
    DomainCatalog::new(
        vec![
            profile("general", &["hola", "buenas"], "La Defensa Pública atiende de 8 a 14."),
            profile("civil", &["desalojo", "contrato"], "Contexto civil."),
            profile(
                "familia",
                &["divorcio", "divorciar", "cuota alimentaria"],
                "Contexto de familia.",
            ),
        ],
        DomainId::from("general"),
    )
}

/// A model answer that passes validation: a text and an action button.
pub fn valid_response_json() -> String {
    r#"{"components":[{"kind":"text","content":"Entiendo tu situación."},{"kind":"action_button","content":"Ver requisitos","payload":{"payload":"requisitos_divorcio"}}]}"#
        .to_string()
}

/// Engine over the test catalog, a local session store, and empty knowledge.
pub fn test_engine(backend: Arc<dyn CompletionBackend>) -> ChatEngine {
    ChatEngine::new(
        backend,
        Arc::new(DomainRegistry::new(test_catalog())),
        Arc::new(StubKnowledge::default()),
        Arc::new(StubIndex::new(Vec::new())),
        SessionManager::with_store(Arc::new(LocalSessionStore::default())),
    )
}
