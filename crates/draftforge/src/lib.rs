//! # Draftforge
//!
//! Server for live, multi-participant drafting sessions: fixed groups of
//! participants taking turns consuming a shared resource pool over
//! WebSocket connections.
//!
//! The layering, bottom up:
//!
//! ```text
//! draftforge-transport    raw connections (WebSocket)
//! draftforge-protocol     envelopes, messages, codecs
//! draftforge-draft        the per-draft state machine (actor)
//! draftforge-coordinator  the process-wide draft/participant directory
//! draftforge (this crate) server loop, connection handler, dispatcher
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use draftforge::prelude::*;
//!
//! # async fn run() -> Result<(), DraftforgeError> {
//! let server = DraftforgeServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//!
//! // Keep a handle for starting drafts, then run the accept loop.
//! let handle = server.handle();
//! # let _ = handle;
//! server.run().await
//! # }
//! ```

mod dispatch;
mod error;
mod handler;
mod server;

pub use error::DraftforgeError;
pub use server::{
    DraftforgeServer, DraftforgeServerBuilder, PROTOCOL_VERSION,
    ServerHandle,
};

/// Commonly used types, re-exported for one-line imports.
pub mod prelude {
    pub use crate::{
        DraftforgeError, DraftforgeServer, DraftforgeServerBuilder,
        PROTOCOL_VERSION, ServerHandle,
    };
    pub use draftforge_coordinator::{
        ConnectionHandle, CoordinatorError, DraftCoordinator, DraftSlot,
    };
    pub use draftforge_draft::{
        DraftConfig, DraftError, DraftState, Drafter, ResourcePool,
    };
    pub use draftforge_protocol::{
        DraftAction, DraftId, DraftMessage, DrafterName, Envelope, Pack,
        ParticipantKey, Payload, PoolItem, PoolItemId, SystemMessage,
    };
}

/// Installs a `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
