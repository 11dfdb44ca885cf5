//! Knowledge layer for Amparo.
//!
//! Three pieces built on one JSON corpus file:
//! - [`CorpusStore`]: loads the file, serves per-domain context, routing
//!   keywords, and FAQ lookups from an atomically swappable snapshot.
//! - [`build_catalog`]: derives the immutable domain catalog the classifier
//!   and prompt builder read.
//! - [`CorpusIndex`]: a ranked lexical search over the corpus implementing
//!   the passage-index seam.

mod catalog;
mod corpus;
mod index;

pub use catalog::build_catalog;
pub use corpus::{CorpusStore, Document};
pub use index::CorpusIndex;

#[cfg(test)]
pub(crate) mod test_support;
