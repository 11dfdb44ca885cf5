//! Domain catalog assembly.
//!
//! A profile merges two sources: id, title and guidance come from
//! configuration; keywords and the static context block come from the
//! corpus. Rebuilding after a corpus reload picks up new tags and
//! documents without touching configuration.

use tracing::info;

use amparo_config::DomainConfig;
use amparo_core::domain::{DEFAULT_DOMAIN, DomainCatalog, DomainId, DomainProfile};
use amparo_core::knowledge::KnowledgeStore;

/// Build an immutable catalog for the configured domains.
pub async fn build_catalog(store: &dyn KnowledgeStore, domains: &[DomainConfig]) -> DomainCatalog {
    let mut profiles = Vec::with_capacity(domains.len());
    for config in domains {
        let id = DomainId::from(&config.id);
        let keywords = store.keywords_for(&id).await;
        let context = store.context_for(&id).await;
        profiles.push(DomainProfile {
            id,
            title: config.title().to_string(),
            keywords,
            context,
            guidance: config.guidance.clone(),
        });
    }

    let catalog = DomainCatalog::new(profiles, DomainId::from(DEFAULT_DOMAIN));
    info!(domains = catalog.len(), "Domain catalog built");
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{domain_config, sample_store};

    #[tokio::test]
    async fn profiles_merge_config_and_corpus() {
        let (_file, store) = sample_store();
        let mut familia = domain_config("familia", "");
        familia.title = "Fuero de Familia".into();
        familia.guidance = "Orientá sobre divorcios y alimentos.".into();

        let catalog = build_catalog(&store, &[familia]).await;

        let profile = catalog.get(&DomainId::from("familia")).unwrap();
        assert_eq!(profile.title, "Fuero de Familia");
        assert_eq!(profile.guidance, "Orientá sobre divorcios y alimentos.");
        assert!(profile.keywords.contains(&"divorcio".to_string()));
        assert!(profile.context.starts_with("Contexto para fuero familia:"));
    }

    #[tokio::test]
    async fn default_domain_is_always_present() {
        let (_file, store) = sample_store();
        let catalog = build_catalog(&store, &[domain_config("familia", "")]).await;

        assert!(catalog.contains(&DomainId::from(DEFAULT_DOMAIN)));
        assert_eq!(catalog.default_domain().as_str(), DEFAULT_DOMAIN);
    }

    #[tokio::test]
    async fn unknown_domain_gets_empty_profile_fields() {
        let (_file, store) = sample_store();
        let catalog = build_catalog(&store, &[domain_config("laboral", "")]).await;

        let profile = catalog.get(&DomainId::from("laboral")).unwrap();
        assert!(profile.keywords.is_empty());
        assert!(profile.context.is_empty());
    }

    #[tokio::test]
    async fn title_falls_back_to_domain_id() {
        let (_file, store) = sample_store();
        let catalog = build_catalog(&store, &[domain_config("familia", "")]).await;

        assert_eq!(catalog.get(&DomainId::from("familia")).unwrap().title, "familia");
    }
}
