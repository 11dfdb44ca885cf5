//! # Amparo Agent
//!
//! The orchestration pipeline: domain classification, grounded context
//! assembly, structured generation, and session-scoped conversation
//! handling.
//!
//! [`ChatEngine`] is the single entry point. The gateway and the CLI drive
//! it in two modes over the same retrieve→generate pipeline:
//! - single-shot via [`ChatEngine::process`], returning a [`ChatOutcome`]
//! - incremental via [`pipeline::stream`], producing ordered
//!   [`amparo_core::PipelineEvent`]s over a channel

pub mod classifier;
pub mod context;
pub mod engine;
pub mod generator;
pub mod pipeline;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::{ChatEngine, ChatOutcome};
