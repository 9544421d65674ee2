//! The draft event dispatcher: the bridge from draft actors back to the
//! coordinator and the live connections.
//!
//! Draft actors know participants only by key. This task resolves each
//! outbound event through the coordinator's registry and forwards it on
//! whatever connection happens to be attached right now — a detached
//! participant simply misses the message and catches up via resync when
//! they reconnect.
//!
//! Completion signals also land here: the dispatcher is the "owner"
//! callback the coordinator's `complete_draft` is wired to.

use std::sync::Arc;

use draftforge_coordinator::DraftCoordinator;
use draftforge_draft::DraftEvent;
use draftforge_protocol::{Envelope, Payload};
use tokio::sync::mpsc;

/// Drains the shared draft event channel until every sender is gone.
pub(crate) async fn run_dispatcher(
    mut events: mpsc::UnboundedReceiver<DraftEvent>,
    coordinator: Arc<DraftCoordinator>,
) {
    while let Some(event) = events.recv().await {
        match event {
            DraftEvent::Outbound { key, msg } => {
                // A slot can be gone (draft completed between emit and
                // dispatch) or detached; both mean "drop the message".
                let Some(slot) = coordinator.slot(key) else {
                    continue;
                };
                let Some(conn) = slot.connection() else {
                    continue;
                };
                // seq/timestamp are stamped by the connection's writer.
                conn.send(Envelope {
                    seq: 0,
                    timestamp: 0,
                    payload: Payload::Event(msg),
                });
            }
            DraftEvent::Completed { draft_id } => {
                tracing::info!(%draft_id, "draft signaled completion");
                coordinator.complete_draft(draft_id);
            }
        }
    }

    tracing::debug!("draft event dispatcher stopped");
}
