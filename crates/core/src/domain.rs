//! Domain model: specialization areas and their routing configuration.
//!
//! A domain bundles everything the pipeline needs to specialize a request:
//! the keyword set the classifier scores against, the static context block
//! the assembler injects, and the guidance text folded into the system
//! prompt. Domains are data, not behavior; one engine serves all of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The id of the catch-all domain every deployment carries.
pub const DEFAULT_DOMAIN: &str = "general";

/// Identifier of a specialization domain (e.g. "familia", "penal").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DomainId(pub String);

impl DomainId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the pipeline knows about one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainProfile {
    /// Stable identifier, also the routing key
    pub id: DomainId,

    /// Human-readable name shown by the domain listing
    pub title: String,

    /// Keywords the classifier scores; lower-cased, sorted, deduplicated
    pub keywords: Vec<String>,

    /// Static context injected for every request routed here
    pub context: String,

    /// Domain-specific instructions folded into the system prompt
    pub guidance: String,
}

/// An immutable snapshot of every configured domain.
///
/// Iteration order is the sorted order of the ids, which is what makes
/// classification ties deterministic.
#[derive(Debug, Clone)]
pub struct DomainCatalog {
    domains: BTreeMap<DomainId, DomainProfile>,
    default_domain: DomainId,
}

impl DomainCatalog {
    /// Build a catalog from profiles. The default domain is always present:
    /// if no profile carries `default_domain`, an empty one is inserted so
    /// the classifier's zero-score fallback can never dangle.
    pub fn new(profiles: Vec<DomainProfile>, default_domain: DomainId) -> Self {
        let mut domains: BTreeMap<DomainId, DomainProfile> = profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();

        domains.entry(default_domain.clone()).or_insert_with(|| DomainProfile {
            id: default_domain.clone(),
            title: default_domain.as_str().to_string(),
            keywords: Vec::new(),
            context: String::new(),
            guidance: String::new(),
        });

        Self {
            domains,
            default_domain,
        }
    }

    pub fn get(&self, id: &DomainId) -> Option<&DomainProfile> {
        self.domains.get(id)
    }

    pub fn contains(&self, id: &DomainId) -> bool {
        self.domains.contains_key(id)
    }

    /// The domain returned when no keyword matches.
    pub fn default_domain(&self) -> &DomainId {
        &self.default_domain
    }

    /// Profiles in sorted id order.
    pub fn iter(&self) -> impl Iterator<Item = &DomainProfile> {
        self.domains.values()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Shared handle to the current domain catalog.
///
/// Readers take a cheap `Arc` snapshot and classify against it; a reload
/// builds a new catalog off-path and swaps the pointer under a short write
/// lock. In-flight requests keep the snapshot they started with.
#[derive(Debug)]
pub struct DomainRegistry {
    current: RwLock<Arc<DomainCatalog>>,
}

impl DomainRegistry {
    pub fn new(catalog: DomainCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog as of this instant.
    pub async fn snapshot(&self) -> Arc<DomainCatalog> {
        self.current.read().await.clone()
    }

    /// Replace the catalog atomically.
    pub async fn swap(&self, catalog: DomainCatalog) {
        let mut guard = self.current.write().await;
        *guard = Arc::new(catalog);
    }
}
