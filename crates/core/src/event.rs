//! Pipeline streaming events.
//!
//! Incremental execution produces an ordered sequence of typed events that
//! the gateway forwards to clients over SSE:
//! - `metadata`  — selected domain and session id, always first
//! - `component` — one structured-response component, in generation order
//! - `done`      — successful terminal event
//! - `error`     — failure terminal event, institutional message only
//!
//! Exactly one terminal event is emitted per request, success or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainId;
use crate::message::SessionId;
use crate::response::UiComponent;

/// Events emitted by the orchestration pipeline during incremental execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Routing decision, emitted before retrieval completes.
    Metadata {
        domain: DomainId,
        session_id: SessionId,
    },

    /// One component of the structured answer.
    Component { component: UiComponent },

    /// The request completed; no further events follow.
    Done { timestamp: DateTime<Utc> },

    /// The request failed; no further events follow. The message is the
    /// institutional fallback text, never a raw error.
    Error { message: String },
}

impl PipelineEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Metadata { .. } => "metadata",
            Self::Component { .. } => "component",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
