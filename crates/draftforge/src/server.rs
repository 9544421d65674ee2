//! `DraftforgeServer` builder and server loop.
//!
//! This is the entry point for running a Draftforge server. It ties
//! together all the layers: transport → protocol → coordinator → draft.

use std::sync::Arc;

use draftforge_coordinator::{CoordinatorError, DraftCoordinator};
use draftforge_draft::{DraftConfig, ResourcePool};
use draftforge_protocol::{Codec, DraftId, DrafterName, JsonCodec};
use draftforge_transport::{Transport, WebSocketTransport};
use tokio::sync::mpsc;

use crate::DraftforgeError;
use crate::dispatch::run_dispatcher;
use crate::handler::handle_connection;

/// The current protocol version. Clients must send this in their hello
/// or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// coordinator carries its own lock; nothing here needs another one.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) coordinator: Arc<DraftCoordinator>,
    pub(crate) codec: C,
    pub(crate) draft_config: DraftConfig,
}

/// Builder for configuring and starting a Draftforge server.
///
/// # Example
///
/// ```rust,ignore
/// use draftforge::prelude::*;
///
/// let server = DraftforgeServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DraftforgeServerBuilder {
    bind_addr: String,
    draft_config: DraftConfig,
}

impl DraftforgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            draft_config: DraftConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the draft configuration used for every draft this server
    /// starts.
    pub fn draft_config(mut self, config: DraftConfig) -> Self {
        self.draft_config = config;
        self
    }

    /// Builds and starts the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults. Also
    /// spawns the draft event dispatcher, which forwards outbound draft
    /// messages to attached connections and deregisters drafts when
    /// they signal completion.
    pub async fn build(
        self,
    ) -> Result<DraftforgeServer<JsonCodec>, DraftforgeError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let coordinator = Arc::new(DraftCoordinator::new(events_tx));

        tokio::spawn(run_dispatcher(events_rx, Arc::clone(&coordinator)));

        let state = Arc::new(ServerState {
            coordinator,
            codec: JsonCodec,
            draft_config: self.draft_config,
        });

        Ok(DraftforgeServer { transport, state })
    }
}

impl Default for DraftforgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable handle to a running server, used to start drafts.
///
/// Starting a draft is an in-process request (a lobby, an admin surface,
/// a test harness) — it never arrives over the drafting connections
/// themselves, which only ever present keys for drafts that already
/// exist.
#[derive(Clone)]
pub struct ServerHandle {
    coordinator: Arc<DraftCoordinator>,
    draft_config: DraftConfig,
}

impl ServerHandle {
    /// Starts a draft for the given participants over the given pool.
    ///
    /// See [`DraftCoordinator::start_draft`] for the validation rules.
    pub async fn start_draft(
        &self,
        names: Vec<DrafterName>,
        pool: ResourcePool,
    ) -> Result<DraftId, CoordinatorError> {
        self.coordinator
            .start_draft(names, pool, self.draft_config)
            .await
    }

    /// The underlying coordinator, for lookups and teardown.
    pub fn coordinator(&self) -> &DraftCoordinator {
        &self.coordinator
    }
}

/// A running Draftforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DraftforgeServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl DraftforgeServer<JsonCodec> {
    /// Creates a new builder (which produces a `JsonCodec` server).
    pub fn builder() -> DraftforgeServerBuilder {
        DraftforgeServerBuilder::new()
    }
}

impl<C> DraftforgeServer<C>
where
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle for starting drafts on this server.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            coordinator: Arc::clone(&self.state.coordinator),
            draft_config: self.state.draft_config,
        }
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), DraftforgeError> {
        tracing::info!("Draftforge server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
