//! Keyword-based domain classifier.
//!
//! Scores the query against every domain's keyword set and routes to the
//! strict maximum. Multi-word keywords weigh more than single words, so
//! "cuota alimentaria" beats a lone "cuota" hit; a zero maximum falls back
//! to the default domain. Pure function of one catalog snapshot, never
//! fails.

use amparo_core::{DomainCatalog, DomainId};
use tracing::debug;

/// Classify a query into a domain id.
///
/// Keywords match as substrings of the lower-cased query; each hit scores
/// its word count. Ties among equal non-zero maxima resolve to the smallest
/// domain id, which the catalog's sorted iteration order yields directly.
/// Keywords are expected lower-cased, which the catalog build guarantees.
pub fn classify(catalog: &DomainCatalog, query: &str) -> DomainId {
    let query = query.to_lowercase();

    let mut best_id: Option<&DomainId> = None;
    let mut best_score = 0u32;
    for profile in catalog.iter() {
        let score = score_keywords(&profile.keywords, &query);
        if score > best_score {
            best_score = score;
            best_id = Some(&profile.id);
        }
    }

    match best_id {
        Some(id) => {
            debug!(domain = %id, score = best_score, "Query classified by keyword match");
            id.clone()
        }
        None => {
            debug!("No keyword match, routing to default domain");
            catalog.default_domain().clone()
        }
    }
}

fn score_keywords(keywords: &[String], query: &str) -> u32 {
    keywords
        .iter()
        .filter(|keyword| query.contains(keyword.as_str()))
        .map(|keyword| keyword.split_whitespace().count() as u32)
        .sum()
}
