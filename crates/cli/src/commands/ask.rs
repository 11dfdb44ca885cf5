//! `amparo ask` — One-shot query from the terminal.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use amparo_agent::ChatEngine;
use amparo_core::{DomainId, DomainRegistry, KnowledgeStore, PassageIndex, SessionId};
use amparo_knowledge::{CorpusIndex, CorpusStore, build_catalog};
use amparo_providers::select_backend;
use amparo_sessions::{LocalSessionStore, SessionManager};

pub async fn run(
    config_path: Option<&Path>,
    message: &str,
    domain: Option<String>,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path).context("Failed to load configuration")?;

    let store = Arc::new(CorpusStore::open(
        config.knowledge.file.clone(),
        &config.domains,
    ));
    let knowledge: Arc<dyn KnowledgeStore> = store.clone();
    let catalog = build_catalog(knowledge.as_ref(), &config.domains).await;
    let registry = Arc::new(DomainRegistry::new(catalog));
    let (backend, _selection) = select_backend(&config);
    let index: Arc<dyn PassageIndex> = Arc::new(CorpusIndex::new(store));

    // One-shot queries never touch the durable session store.
    let sessions = SessionManager::with_store(Arc::new(LocalSessionStore::default()));

    let engine = ChatEngine::new(backend, registry, knowledge, index, sessions)
        .with_search_top_k(config.knowledge.search_top_k);
    debug!(backend = engine.backend_name(), "Engine ready");

    let session_id = SessionId::new();
    let pinned = domain.map(|d| DomainId::from(d.as_str()));

    eprint!("  Consultando...");
    let outcome = engine.process(message, &session_id, pinned.as_ref()).await?;
    eprint!("\r               \r");

    println!("{}", serde_json::to_string_pretty(&outcome.response)?);
    eprintln!();
    eprintln!("  Fuero: {}", outcome.domain);

    Ok(())
}
