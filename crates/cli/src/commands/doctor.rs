//! `amparo doctor` — Diagnose configuration, corpus, and backing services.

use std::path::Path;

use amparo_core::KnowledgeStore;
use amparo_knowledge::CorpusStore;
use amparo_providers::{SelectionKind, select_backend};
use amparo_sessions::SessionManager;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("🩺 Amparo Doctor");
    println!("================\n");

    let mut issues = 0;

    // Configuration
    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Configuración válida");
            config
        }
        Err(e) => {
            println!("  ❌ Configuración inválida: {e}");
            return Err(e.into());
        }
    };

    // Completion backend
    let (backend, selection) = select_backend(&config);
    match selection {
        SelectionKind::Primary => {
            println!("  ✅ Backend primario: {} ({})", backend.name(), config.groq.model);
        }
        SelectionKind::Fallback => {
            println!(
                "  ⚠️  Sin GROQ_API_KEY, backend de respaldo: {} en {}",
                backend.name(),
                config.ollama.host
            );
            issues += 1;
        }
    }

    // Knowledge corpus
    if Path::new(&config.knowledge.file).exists() {
        let store = CorpusStore::open(config.knowledge.file.clone(), &config.domains);
        let documents = store.document_count().await;
        if documents > 0 {
            println!("  ✅ Base de conocimiento: {documents} documentos");
        } else {
            println!(
                "  ⚠️  Base de conocimiento sin documentos: {}",
                config.knowledge.file
            );
            issues += 1;
        }
    } else {
        println!(
            "  ⚠️  Falta el archivo de conocimiento: {}",
            config.knowledge.file
        );
        issues += 1;
    }

    // Session store
    let sessions = SessionManager::connect(&config.session).await;
    if sessions.supports_expiry() {
        println!("  ✅ Sesiones en SQLite: {}", config.session.db_path);
    } else {
        println!(
            "  ⚠️  SQLite no disponible, sesiones en memoria ({})",
            sessions.backend_name()
        );
        issues += 1;
    }

    // Domains
    println!("  ✅ Fueros configurados: {}", config.domains.len());
    for domain in &config.domains {
        println!("      - {} ({})", domain.id, domain.title());
    }

    // Full summary; the Debug impl redacts every key.
    println!();
    println!("Configuración efectiva:");
    println!("{config:#?}");

    println!();
    if issues == 0 {
        println!("  🎉 Todo en orden");
    } else {
        println!("  ⚠️  {issues} problema(s) detectados");
    }

    Ok(())
}
