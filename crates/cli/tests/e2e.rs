//! End-to-end tests for the Amparo pipeline.
//!
//! These exercise the full path from citizen query to structured answer:
//! corpus loading from disk, catalog construction, keyword routing,
//! retrieval, generation, session persistence, streaming, and the HTTP
//! surface, with only the completion backend scripted.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use amparo_agent::{ChatEngine, pipeline};
use amparo_config::{AppConfig, DomainConfig};
use amparo_core::{
    AlertLevel, ChatMessage, CompletionBackend, CompletionError, ComponentKind, DomainId,
    DomainRegistry, EngineError, KnowledgeStore, PassageIndex, PipelineEvent, Role, SessionId,
};
use amparo_gateway::{GatewayState, build_router};
use amparo_knowledge::{CorpusIndex, CorpusStore, build_catalog};
use amparo_providers::SelectionKind;
use amparo_sessions::{LocalSessionStore, SessionManager};

// ── Scripted backend ─────────────────────────────────────────────────────

/// A completion backend that returns scripted results in sequence.
struct ScriptedBackend {
    script: Mutex<Vec<Result<String, CompletionError>>>,
    call_count: Mutex<usize>,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script),
            call_count: Mutex::new(0),
        }
    }

    /// One successful structured completion.
    fn answering(raw: &str) -> Arc<Self> {
        Arc::new(Self::new(vec![Ok(raw.to_string())]))
    }

    /// One failing completion.
    fn failing() -> Arc<Self> {
        Arc::new(Self::new(vec![Err(CompletionError::Timeout(
            "scripted timeout".into(),
        ))]))
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _structured: bool,
    ) -> Result<String, CompletionError> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!("ScriptedBackend exhausted");
        }
        *self.call_count.lock().unwrap() += 1;
        script.remove(0)
    }
}

// ── Corpus fixture ───────────────────────────────────────────────────────

const CORPUS: &str = r#"{
    "documents": [
        {
            "id": "inst-01",
            "titulo": "Defensa Pública de Mendoza",
            "contenido": "Organismo que garantiza el acceso a la justicia de manera gratuita.",
            "tipo": "informacion",
            "seccion": "institucional",
            "tags": ["general"]
        },
        {
            "id": "contacto-01",
            "titulo": "Sede Central",
            "contenido": "Av. España 480, Ciudad de Mendoza. Tel: 0800-555-JUSTICIA.",
            "tipo": "informacion",
            "seccion": "contacto",
            "tags": ["general"]
        },
        {
            "id": "fam-01",
            "titulo": "Fuero de Familia",
            "contenido": "Atiende divorcios, cuota alimentaria y violencia familiar.",
            "tipo": "informacion",
            "seccion": "familia",
            "tags": ["familia", "divorcio", "cuota alimentaria"]
        },
        {
            "id": "fam-02",
            "titulo": "Divorcio de común acuerdo",
            "contenido": "Se tramita ante el juez de familia con patrocinio gratuito.",
            "tipo": "tramite",
            "seccion": "familia",
            "tags": ["familia", "divorcio"]
        },
        {
            "id": "faq-01",
            "titulo": "¿Cómo inicio un divorcio?",
            "contenido": "Acercate a la delegación más cercana con tu DNI y acta de matrimonio.",
            "tipo": "pregunta_respuesta",
            "seccion": "familia",
            "tags": ["familia", "divorcio"]
        }
    ]
}"#;

/// [`CORPUS`] plus a penal document, for reload tests.
const CORPUS_WITH_PENAL: &str = r#"{
    "documents": [
        {
            "id": "inst-01",
            "titulo": "Defensa Pública de Mendoza",
            "contenido": "Organismo que garantiza el acceso a la justicia de manera gratuita.",
            "tipo": "informacion",
            "seccion": "institucional",
            "tags": ["general"]
        },
        {
            "id": "contacto-01",
            "titulo": "Sede Central",
            "contenido": "Av. España 480, Ciudad de Mendoza. Tel: 0800-555-JUSTICIA.",
            "tipo": "informacion",
            "seccion": "contacto",
            "tags": ["general"]
        },
        {
            "id": "fam-01",
            "titulo": "Fuero de Familia",
            "contenido": "Atiende divorcios, cuota alimentaria y violencia familiar.",
            "tipo": "informacion",
            "seccion": "familia",
            "tags": ["familia", "divorcio", "cuota alimentaria"]
        },
        {
            "id": "fam-02",
            "titulo": "Divorcio de común acuerdo",
            "contenido": "Se tramita ante el juez de familia con patrocinio gratuito.",
            "tipo": "tramite",
            "seccion": "familia",
            "tags": ["familia", "divorcio"]
        },
        {
            "id": "faq-01",
            "titulo": "¿Cómo inicio un divorcio?",
            "contenido": "Acercate a la delegación más cercana con tu DNI y acta de matrimonio.",
            "tipo": "pregunta_respuesta",
            "seccion": "familia",
            "tags": ["familia", "divorcio"]
        },
        {
            "id": "pen-01",
            "titulo": "Fuero Penal",
            "contenido": "Defensa técnica gratuita en causas penales.",
            "tipo": "informacion",
            "seccion": "penal",
            "tags": ["penal", "robo", "defensa penal"]
        }
    ]
}"#;

const STRUCTURED_ANSWER: &str = r#"{"components":[{"kind":"text","content":"Para iniciar un divorcio acercate a la delegación más cercana con tu DNI."},{"kind":"action_button","content":"Ver requisitos","payload":{"payload":"requisitos_divorcio"}}]}"#;

fn fuero(id: &str) -> DomainConfig {
    DomainConfig {
        id: id.into(),
        title: String::new(),
        tag: String::new(),
        guidance: String::new(),
    }
}

fn domains() -> Vec<DomainConfig> {
    vec![fuero("general"), fuero("familia"), fuero("penal")]
}

/// A full engine over a real corpus file. The temp file must stay alive so
/// reload tests can rewrite it.
async fn engine_over(
    corpus: &str,
    backend: Arc<ScriptedBackend>,
) -> (
    NamedTempFile,
    Arc<CorpusStore>,
    Arc<DomainRegistry>,
    Arc<ChatEngine>,
) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(corpus.as_bytes()).unwrap();

    let store = Arc::new(CorpusStore::open(file.path(), &domains()));
    let knowledge: Arc<dyn KnowledgeStore> = store.clone();
    let catalog = build_catalog(knowledge.as_ref(), &domains()).await;
    let registry = Arc::new(DomainRegistry::new(catalog));
    let index: Arc<dyn PassageIndex> = Arc::new(CorpusIndex::new(store.clone()));
    let sessions = SessionManager::with_store(Arc::new(LocalSessionStore::default()));

    let engine = Arc::new(ChatEngine::new(
        backend,
        registry.clone(),
        knowledge,
        index,
        sessions,
    ));

    (file, store, registry, engine)
}

fn gateway_state(
    store: Arc<CorpusStore>,
    registry: Arc<DomainRegistry>,
    engine: Arc<ChatEngine>,
) -> Arc<GatewayState> {
    let knowledge: Arc<dyn KnowledgeStore> = store;
    Arc::new(GatewayState {
        engine,
        registry,
        knowledge,
        domains: domains(),
        selection: SelectionKind::Primary,
        admin_key: None,
    })
}

// ── E2E: single-shot pipeline ────────────────────────────────────────────

#[tokio::test]
async fn e2e_divorce_query_routes_retrieves_and_answers() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (_file, _store, _registry, engine) = engine_over(CORPUS, backend.clone()).await;
    let session = SessionId::from("e2e-1");

    let outcome = engine
        .process("Necesito ayuda con mi divorcio", &session, None)
        .await
        .unwrap();

    assert_eq!(outcome.domain.as_str(), "familia");
    assert_eq!(outcome.session_id, session);
    assert!(outcome.response.validate().is_ok());
    assert_eq!(outcome.response.components.len(), 2);
    assert_eq!(outcome.response.components[0].kind, ComponentKind::Text);
    assert_eq!(backend.calls(), 1);

    // Both turns persisted, user first.
    let history = engine.sessions().history(&session).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn e2e_followup_accumulates_session_history() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(STRUCTURED_ANSWER.to_string()),
        Ok(STRUCTURED_ANSWER.to_string()),
    ]));
    let (_file, _store, _registry, engine) = engine_over(CORPUS, backend.clone()).await;
    let session = SessionId::from("e2e-2");

    engine
        .process("Necesito ayuda con mi divorcio", &session, None)
        .await
        .unwrap();
    engine
        .process("¿Qué documentación tengo que llevar?", &session, None)
        .await
        .unwrap();

    assert_eq!(backend.calls(), 2);
    let history = engine.sessions().history(&session).await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].content, "Necesito ayuda con mi divorcio");
    assert_eq!(history[2].content, "¿Qué documentación tengo que llevar?");
}

#[tokio::test]
async fn e2e_backend_failure_degrades_to_institutional_alert() {
    let backend = ScriptedBackend::failing();
    let (_file, _store, _registry, engine) = engine_over(CORPUS, backend).await;

    let outcome = engine
        .process("Necesito ayuda con mi divorcio", &SessionId::from("e2e-3"), None)
        .await
        .unwrap();

    assert_eq!(outcome.response.components.len(), 1);
    let alert = &outcome.response.components[0];
    assert_eq!(alert.kind, ComponentKind::Alert);
    assert_eq!(alert.severity, Some(AlertLevel::Error));
    assert!(alert.content.contains("0800-555-JUSTICIA"));
}

#[tokio::test]
async fn e2e_pinned_domain_skips_classification() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (_file, _store, _registry, engine) = engine_over(CORPUS, backend).await;

    let outcome = engine
        .process(
            "Necesito ayuda con mi divorcio",
            &SessionId::from("e2e-4"),
            Some(&DomainId::from("penal")),
        )
        .await
        .unwrap();

    assert_eq!(outcome.domain.as_str(), "penal");
}

#[tokio::test]
async fn e2e_unknown_pinned_domain_is_rejected() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (_file, _store, _registry, engine) = engine_over(CORPUS, backend).await;

    let result = engine
        .process("hola", &SessionId::from("e2e-5"), Some(&DomainId::from("laboral")))
        .await;

    assert!(matches!(result, Err(EngineError::UnknownDomain(d)) if d == "laboral"));
}

// ── E2E: streaming pipeline ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_stream_emits_metadata_components_done() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (_file, _store, _registry, engine) = engine_over(CORPUS, backend).await;

    let mut rx = pipeline::stream(
        engine,
        "Necesito ayuda con mi divorcio".into(),
        SessionId::from("stream-1"),
        None,
    );

    let mut events = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
    })
    .await
    .expect("stream should terminate");

    assert_eq!(events.len(), 4); // metadata + two components + done
    assert!(matches!(
        &events[0],
        PipelineEvent::Metadata { domain, session_id }
            if domain.as_str() == "familia" && session_id.as_str() == "stream-1"
    ));
    assert!(matches!(&events[1], PipelineEvent::Component { .. }));
    assert!(matches!(&events[2], PipelineEvent::Component { .. }));
    assert_eq!(events[3].event_type(), "done");
    assert!(events[3].is_terminal());
}

// ── E2E: corpus reload ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_reload_extends_routing_to_new_domains() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (file, store, registry, engine) = engine_over(CORPUS, backend).await;

    // No penal documents yet, so the query lands on the default fuero.
    let domain = engine.resolve_domain("Me acusan de robo", None).await.unwrap();
    assert_eq!(domain.as_str(), "general");

    std::fs::write(file.path(), CORPUS_WITH_PENAL).unwrap();
    let documents = store.reload().await.unwrap();
    assert_eq!(documents, 6);

    let knowledge: Arc<dyn KnowledgeStore> = store.clone();
    let catalog = build_catalog(knowledge.as_ref(), &domains()).await;
    registry.swap(catalog).await;

    let domain = engine.resolve_domain("Me acusan de robo", None).await.unwrap();
    assert_eq!(domain.as_str(), "penal");
}

// ── E2E: HTTP gateway (router only, no server) ───────────────────────────

#[tokio::test]
async fn e2e_gateway_health_reflects_the_corpus() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (_file, store, registry, engine) = engine_over(CORPUS, backend).await;
    let app = build_router(gateway_state(store, registry, engine), &["*".to_string()]);

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["knowledge_base"]["status"], "loaded");
    assert_eq!(json["knowledge_base"]["documents"], 5);
    assert_eq!(json["backend"]["name"], "e2e_mock");
}

#[tokio::test]
async fn e2e_gateway_chat_round_trip() {
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let (_file, store, registry, engine) = engine_over(CORPUS, backend).await;
    let app = build_router(gateway_state(store, registry, engine), &["*".to_string()]);

    let body = serde_json::json!({
        "message": "Necesito ayuda con mi divorcio",
        "session_id": "ciudadano-1"
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["domain"], "familia");
    assert_eq!(json["session_id"], "ciudadano-1");
    assert_eq!(json["response"]["components"][0]["kind"], "text");
}

// ── E2E: configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_file_drives_the_domain_catalog() {
    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(
            br#"
[[domains]]
id = "general"

[[domains]]
id = "consumidor"
tag = "defensa-consumidor"
"#,
        )
        .unwrap();
    let config = AppConfig::load_at(config_file.path()).unwrap();
    assert_eq!(config.domains.len(), 2);

    let mut corpus_file = NamedTempFile::new().unwrap();
    corpus_file
        .write_all(
            r#"{"documents":[{
                "id": "cons-01",
                "titulo": "Defensa del Consumidor",
                "contenido": "Reclamos por garantía y servicios defectuosos.",
                "tipo": "informacion",
                "seccion": "consumidor",
                "tags": ["defensa-consumidor", "garantía", "reclamo"]
            }]}"#
                .as_bytes(),
        )
        .unwrap();

    let store = Arc::new(CorpusStore::open(corpus_file.path(), &config.domains));
    let knowledge: Arc<dyn KnowledgeStore> = store.clone();
    let catalog = build_catalog(knowledge.as_ref(), &config.domains).await;
    let registry = Arc::new(DomainRegistry::new(catalog));
    let index: Arc<dyn PassageIndex> = Arc::new(CorpusIndex::new(store));
    let sessions = SessionManager::with_store(Arc::new(LocalSessionStore::default()));
    let backend = ScriptedBackend::answering(STRUCTURED_ANSWER);
    let engine = ChatEngine::new(backend, registry, knowledge, index, sessions);

    let outcome = engine
        .process(
            "No me respetan la garantía del lavarropas",
            &SessionId::new(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.domain.as_str(), "consumidor");
}
