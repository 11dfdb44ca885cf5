//! REST and SSE handlers.
//!
//! Response bodies that reach citizens are written in Spanish; routing,
//! state, and logs stay in English. Failures the pipeline absorbs arrive
//! here as normal answers, so the handlers only deal with validation
//! errors, unknown pinned domains, and orchestration invariants.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event as SseEvent, Sse},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use amparo_agent::{ChatOutcome, pipeline};
use amparo_core::{DomainId, EngineError, SessionId};
use amparo_knowledge::build_catalog;

use crate::SharedState;

/// Inclusive upper bound on one chat message, part of the public contract.
const MESSAGE_MAX_CHARS: usize = 1000;

/// All gateway routes.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(banner_handler))
        .route("/api/health", get(health_handler))
        .route("/api/domains", get(list_domains_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .route("/api/session/{id}", delete(clear_session_handler))
        .route("/api/admin/reload", post(reload_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Deserialize)]
struct ChatRequest {
    /// The citizen's message.
    message: String,
    /// Existing session id; omit or leave empty to start a new session.
    #[serde(default)]
    session_id: Option<String>,
    /// Pin a domain instead of classifying the message.
    #[serde(default)]
    domain: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct BannerResponse {
    name: String,
    version: String,
    status: String,
}

#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    knowledge_base: KnowledgeHealth,
    backend: BackendHealth,
    sessions: SessionsHealth,
}

#[derive(Serialize, Deserialize)]
struct KnowledgeHealth {
    status: String,
    documents: usize,
}

#[derive(Serialize, Deserialize)]
struct BackendHealth {
    name: String,
    selection: String,
}

#[derive(Serialize, Deserialize)]
struct SessionsHealth {
    backend: String,
    supports_expiry: bool,
    active: usize,
}

#[derive(Serialize, Deserialize)]
struct DomainsResponse {
    domains: Vec<DomainSummary>,
}

#[derive(Serialize, Deserialize)]
struct DomainSummary {
    id: String,
    title: String,
    keywords: usize,
}

#[derive(Serialize, Deserialize)]
struct ClearSessionResponse {
    message: String,
    session_id: String,
}

#[derive(Serialize, Deserialize)]
struct ReloadResponse {
    message: String,
    documents: usize,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn engine_error(e: EngineError) -> ApiError {
    match e {
        EngineError::UnknownDomain(domain) => api_error(
            StatusCode::BAD_REQUEST,
            format!("Fuero desconocido: {domain}"),
        ),
        e => {
            error!(error = %e, "Engine request failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor",
            )
        }
    }
}

fn validate_message(message: &str) -> Result<(), ApiError> {
    let length = message.chars().count();
    if length == 0 || length > MESSAGE_MAX_CHARS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "El mensaje debe tener entre 1 y 1000 caracteres",
        ));
    }
    Ok(())
}

/// An explicit session id is reused; a missing or empty one starts a new
/// session under a fresh UUID.
fn session_or_new(id: Option<&str>) -> SessionId {
    match id {
        Some(id) if !id.is_empty() => SessionId::from(id),
        _ => SessionId::new(),
    }
}

fn pinned_domain(domain: Option<&str>) -> Option<DomainId> {
    domain.filter(|d| !d.is_empty()).map(DomainId::from)
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `GET /` — service banner.
async fn banner_handler() -> Json<BannerResponse> {
    Json(BannerResponse {
        name: "Amparo - Defensa Pública de Mendoza".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        status: "online".into(),
    })
}

/// `GET /api/health` — liveness plus a snapshot of every subsystem.
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let documents = state.knowledge.document_count().await;
    let sessions = state.engine.sessions();

    Json(HealthResponse {
        status: "healthy".into(),
        knowledge_base: KnowledgeHealth {
            status: if documents > 0 { "loaded" } else { "empty" }.into(),
            documents,
        },
        backend: BackendHealth {
            name: state.engine.backend_name().into(),
            selection: state.selection.as_str().into(),
        },
        sessions: SessionsHealth {
            backend: sessions.backend_name().into(),
            supports_expiry: sessions.supports_expiry(),
            active: sessions.session_count().await,
        },
    })
}

/// `GET /api/domains` — the domains the live catalog routes to.
async fn list_domains_handler(State(state): State<SharedState>) -> Json<DomainsResponse> {
    let catalog = state.registry.snapshot().await;
    let domains = catalog
        .iter()
        .map(|profile| DomainSummary {
            id: profile.id.to_string(),
            title: profile.title.clone(),
            keywords: profile.keywords.len(),
        })
        .collect();

    Json(DomainsResponse { domains })
}

/// `POST /api/chat` — run one message through the pipeline, single-shot.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, ApiError> {
    validate_message(&payload.message)?;

    let session_id = session_or_new(payload.session_id.as_deref());
    let pinned = pinned_domain(payload.domain.as_deref());
    debug!(session = %session_id, "Chat request");

    let outcome = state
        .engine
        .process(&payload.message, &session_id, pinned.as_ref())
        .await
        .map_err(engine_error)?;

    Ok(Json(outcome))
}

/// `POST /api/chat/stream` — the same pipeline as an SSE event stream.
///
/// Validation failures surface as plain HTTP errors before any stream
/// starts; once streaming, failures arrive as terminal error events.
async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    validate_message(&payload.message)?;

    let session_id = session_or_new(payload.session_id.as_deref());
    let pinned = pinned_domain(payload.domain.as_deref());

    if let Some(domain) = pinned.as_ref() {
        state
            .engine
            .resolve_domain(&payload.message, Some(domain))
            .await
            .map_err(engine_error)?;
    }

    debug!(session = %session_id, "Streaming chat request");

    let rx = pipeline::stream(state.engine.clone(), payload.message, session_id, pinned);
    let stream = ReceiverStream::new(rx).map(|event| {
        debug!(event = event.event_type(), "SSE frame");
        let data = serde_json::to_string(&event).unwrap_or_default();
        // The event tag travels inside the payload, so frames stay
        // data-only and any EventSource client sees them as messages.
        Ok(SseEvent::default().data(data))
    });

    Ok(Sse::new(stream))
}

/// `DELETE /api/session/{id}` — drop a session's history.
async fn clear_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<ClearSessionResponse> {
    let session_id = SessionId::from(&id);
    state.engine.sessions().clear(&session_id).await;
    info!(session = %session_id, "Session cleared");

    Json(ClearSessionResponse {
        message: "Sesión limpiada".into(),
        session_id: id,
    })
}

/// `POST /api/admin/reload` — reload the corpus and swap in a rebuilt
/// domain catalog. Guarded by the configured admin key; an unset or empty
/// key disables the endpoint entirely.
async fn reload_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiError> {
    let provided = headers.get("x-admin-key").and_then(|v| v.to_str().ok());
    let authorized = matches!(
        (state.admin_key.as_deref(), provided),
        (Some(expected), Some(given)) if !expected.is_empty() && given == expected
    );
    if !authorized {
        warn!("Rejected knowledge reload: missing or invalid admin key");
        return Err(api_error(StatusCode::FORBIDDEN, "Acceso denegado"));
    }

    let documents = state.knowledge.reload().await.map_err(|e| {
        error!(error = %e, "Knowledge reload failed");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No se pudo recargar la base de conocimiento",
        )
    })?;

    let catalog = build_catalog(state.knowledge.as_ref(), &state.domains).await;
    state.registry.swap(catalog).await;
    info!(documents, "Knowledge base reloaded and catalog swapped");

    Ok(Json(ReloadResponse {
        message: "Base de conocimiento recargada".into(),
        documents,
    }))
}
