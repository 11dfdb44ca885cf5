//! Incremental execution: the pipeline as an ordered event stream.
//!
//! A spawned task runs the same retrieve→generate pass as single-shot mode
//! and emits typed events over a channel: one metadata event first, then
//! components in generation order, then exactly one terminal event. A
//! failure after the stream started still terminates it with an error
//! event carrying institutional text, never a raw error.

use std::sync::Arc;

use amparo_core::{DomainId, PipelineEvent, SessionId};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::error;

use crate::engine::ChatEngine;

/// User-facing text for failures the pipeline could not absorb.
pub const SERVICE_ERROR_TEXT: &str = "Disculpa, estoy experimentando dificultades técnicas. \
     Por favor, intenta nuevamente en unos momentos o contacta directamente a la Defensa \
     Pública al 0800-555-JUSTICIA.";

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Run one request incrementally, returning the event receiver.
///
/// The pipeline runs in a spawned task; dropping the receiver stops event
/// emission at the next send.
pub fn stream(
    engine: Arc<ChatEngine>,
    message: String,
    session_id: SessionId,
    pinned: Option<DomainId>,
) -> mpsc::Receiver<PipelineEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        run_stream(engine, message, session_id, pinned, tx).await;
    });
    rx
}

async fn run_stream(
    engine: Arc<ChatEngine>,
    message: String,
    session_id: SessionId,
    pinned: Option<DomainId>,
    tx: mpsc::Sender<PipelineEvent>,
) {
    let domain = match engine.resolve_domain(&message, pinned.as_ref()).await {
        Ok(domain) => domain,
        Err(e) => {
            error!(error = %e, "Stream failed before routing");
            let _ = tx
                .send(PipelineEvent::Error {
                    message: SERVICE_ERROR_TEXT.into(),
                })
                .await;
            return;
        }
    };

    let metadata = PipelineEvent::Metadata {
        domain: domain.clone(),
        session_id: session_id.clone(),
    };
    if tx.send(metadata).await.is_err() {
        return;
    }

    match engine.run_pipeline(&message, &session_id, &domain).await {
        Ok(response) => {
            for component in response.components {
                if tx.send(PipelineEvent::Component { component }).await.is_err() {
                    return;
                }
            }
            let _ = tx
                .send(PipelineEvent::Done {
                    timestamp: Utc::now(),
                })
                .await;
        }
        Err(e) => {
            error!(error = %e, "Stream failed mid-pipeline");
            let _ = tx
                .send(PipelineEvent::Error {
                    message: SERVICE_ERROR_TEXT.into(),
                })
                .await;
        }
    }
}
