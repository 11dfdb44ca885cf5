//! HTTP API gateway for Amparo.
//!
//! Exposes the assistant's public surface: single-shot and streaming chat,
//! domain listing, session cleanup, health reporting, and an admin-keyed
//! knowledge reload.
//!
//! Built on Axum. Every subsystem is constructed once in [`start`] and
//! shared through [`GatewayState`].

pub mod api;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use amparo_agent::ChatEngine;
use amparo_config::{AppConfig, DomainConfig};
use amparo_core::{DomainRegistry, KnowledgeStore, PassageIndex};
use amparo_knowledge::{CorpusIndex, CorpusStore, build_catalog};
use amparo_providers::{SelectionKind, select_backend};
use amparo_sessions::SessionManager;

/// Request bodies above this size are rejected outright.
const BODY_LIMIT_BYTES: usize = 1024 * 1024; // 1 MB

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ChatEngine>,
    pub registry: Arc<DomainRegistry>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    /// Domain configuration, kept for catalog rebuilds after a reload.
    pub domains: Vec<DomainConfig>,
    pub selection: SelectionKind,
    pub admin_key: Option<String>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes and layers.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    api::api_router(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS policy from the configured origins; a literal `"*"` entry allows
/// any origin. Unparseable entries are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let mut allowed: Vec<HeaderValue> = Vec::with_capacity(origins.len());
        for origin in origins {
            match origin.parse() {
                Ok(value) => allowed.push(value),
                Err(_) => warn!(origin = %origin, "Ignoring unparseable CORS origin"),
            }
        }
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-key"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Builds every subsystem once: corpus store, domain catalog, completion
/// backend, passage index, and session manager. Serves until the process
/// is stopped.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let store = Arc::new(CorpusStore::open(
        config.knowledge.file.clone(),
        &config.domains,
    ));
    let knowledge: Arc<dyn KnowledgeStore> = store.clone();

    let catalog = build_catalog(knowledge.as_ref(), &config.domains).await;
    let registry = Arc::new(DomainRegistry::new(catalog));

    let (backend, selection) = select_backend(&config);
    let index: Arc<dyn PassageIndex> = Arc::new(CorpusIndex::new(store));
    let sessions = SessionManager::connect(&config.session).await;

    let engine = Arc::new(
        ChatEngine::new(backend, registry.clone(), knowledge.clone(), index, sessions)
            .with_search_top_k(config.knowledge.search_top_k),
    );

    let state = Arc::new(GatewayState {
        engine,
        registry,
        knowledge,
        domains: config.domains.clone(),
        selection,
        admin_key: config.admin.api_key.clone(),
    });

    let app = build_router(state, &config.server.cors_origins);

    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
