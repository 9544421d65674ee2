//! Per-connection handler: hello, key resolution, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive Hello → validate version → resolve the key to a slot
//!   2. Attach a fresh `ConnectionHandle` (reconnect replaces the old one)
//!   3. Send HelloAck, then replay the pending pack (reconnect catch-up)
//!   4. Loop: receive envelopes → answer heartbeats, route picks
//!   5. On any exit path, detach — but only if this handler's own
//!      connection is still the one attached

use std::sync::Arc;
use std::time::{Duration, Instant};

use draftforge_coordinator::{ConnectionHandle, DraftSlot};
use draftforge_protocol::{
    Codec, DraftAction, DraftMessage, Envelope, ParticipantKey, Payload,
    ProtocolError, SystemMessage,
};
use draftforge_transport::{
    Connection, ConnectionId, WebSocketConnection,
};
use tokio::sync::mpsc;

use crate::DraftforgeError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// How long a fresh connection gets to present its key.
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle cutoff; clients heartbeat every ~5 seconds.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Drop guard that detaches the participant's connection when the
/// handler exits — including by panic.
///
/// Uses `disconnect_if_current` rather than a plain disconnect: if the
/// participant already reconnected through another socket, that fresher
/// attachment must survive this handler's teardown.
struct ConnectionGuard<C: Codec> {
    key: ParticipantKey,
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.state
            .coordinator
            .disconnect_if_current(self.key, self.conn_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DraftforgeError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let start = Instant::now();

    // --- Step 1: hello ---
    let (key, slot) = perform_hello(&conn, &state, &start).await?;
    let draft = slot.draft().clone();
    let name = slot.drafter().name().clone();

    tracing::info!(%conn_id, drafter = %name, "participant recognized");

    // --- Step 2: attach ---
    // All outbound traffic funnels through this channel; the writer
    // task stamps sequence numbers and owns the socket's send side.
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let handle = ConnectionHandle::new(conn_id, out_tx);
    state.coordinator.connect(key, handle.clone());
    let _guard = ConnectionGuard {
        key,
        conn_id,
        state: Arc::clone(&state),
    };
    let writer = tokio::spawn(run_writer(
        conn.clone(),
        out_rx,
        Arc::clone(&state),
        start,
    ));

    handle.send(envelope(Payload::System(SystemMessage::HelloAck {
        draft_id: draft.draft_id(),
        name,
        server_time: elapsed_ms(&start),
    })));

    // --- Step 3: catch-up ---
    // The pack waiting on this seat (if any) was presented while no
    // connection was attached, or to a connection that has since died.
    match draft.resync(key).await {
        Ok(info) => {
            if let Some(pack) = info.pack {
                handle.send(envelope(Payload::Event(
                    DraftMessage::PackPresented { pack },
                )));
            }
        }
        Err(e) => {
            tracing::debug!(%key, error = %e, "resync failed");
        }
    }

    // --- Step 4: message loop ---
    loop {
        let data =
            match tokio::time::timeout(IDLE_TIMEOUT, conn.recv()).await {
                Ok(Ok(Some(data))) => data,
                Ok(Ok(None)) => {
                    tracing::info!(%key, "connection closed cleanly");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::debug!(%key, error = %e, "recv error");
                    break;
                }
                Err(_) => {
                    tracing::info!(%key, "connection timed out");
                    break;
                }
            };

        let inbound: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(
                    %key, error = %e, "failed to decode envelope"
                );
                continue;
            }
        };

        match inbound.payload {
            Payload::System(SystemMessage::Heartbeat { client_time }) => {
                handle.send(envelope(Payload::System(
                    SystemMessage::HeartbeatAck {
                        client_time,
                        server_time: elapsed_ms(&start),
                    },
                )));
            }

            Payload::System(SystemMessage::Disconnect { reason }) => {
                tracing::info!(%key, %reason, "client disconnected");
                break;
            }

            Payload::System(_) => {
                tracing::debug!(
                    %key, "ignoring unexpected system message"
                );
            }

            Payload::Action(DraftAction::Pick { item }) => {
                // The pick's effects come back through the dispatcher
                // (PickRecorded, the next PackPresented); only failures
                // are answered inline.
                if let Err(e) = draft.pick(key, item).await {
                    tracing::debug!(%key, error = %e, "pick rejected");
                    handle.send(error_envelope(409, &e.to_string()));
                }
            }

            Payload::Event(_) => {
                tracing::debug!(
                    %key, "client sent a server-only payload, ignoring"
                );
            }
        }
    }

    // --- Step 5: teardown ---
    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → disconnect_if_current fires.
    Ok(())
}

/// Performs the initial exchange: receive Hello, validate the version,
/// resolve the key.
async fn perform_hello<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    start: &Instant,
) -> Result<(ParticipantKey, DraftSlot), DraftforgeError> {
    let data =
        match tokio::time::timeout(HELLO_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(DraftforgeError::Protocol(
                    ProtocolError::InvalidMessage(
                        "connection closed before hello".into(),
                    ),
                ));
            }
            Ok(Err(e)) => return Err(DraftforgeError::Transport(e)),
            Err(_) => {
                return Err(DraftforgeError::Protocol(
                    ProtocolError::InvalidMessage(
                        "hello timed out".into(),
                    ),
                ));
            }
        };

    let inbound: Envelope = state.codec.decode(&data)?;

    let (version, key) = match inbound.payload {
        Payload::System(SystemMessage::Hello { version, key }) => {
            (version, key)
        }
        _ => {
            send_direct(conn, state, 400, "expected Hello", start)
                .await?;
            return Err(DraftforgeError::Protocol(
                ProtocolError::InvalidMessage(
                    "first message must be Hello".into(),
                ),
            ));
        }
    };

    if version != PROTOCOL_VERSION {
        send_direct(
            conn,
            state,
            400,
            &format!(
                "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
            ),
            start,
        )
        .await?;
        return Err(DraftforgeError::Protocol(
            ProtocolError::InvalidMessage(
                "protocol version mismatch".into(),
            ),
        ));
    }

    // An unknown key is not a server error: stale (the draft completed)
    // or forged. The client is told and the socket is dropped.
    let Some(slot) = state.coordinator.slot(key) else {
        send_direct(conn, state, 404, "unknown participant key", start)
            .await?;
        return Err(DraftforgeError::Protocol(
            ProtocolError::InvalidMessage(
                "unknown participant key".into(),
            ),
        ));
    };

    Ok((key, slot))
}

/// Owns the socket's send side: stamps sequence numbers and timestamps
/// on queued envelopes and writes them out, until the channel or the
/// socket closes.
async fn run_writer<C: Codec>(
    conn: WebSocketConnection,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    state: Arc<ServerState<C>>,
    start: Instant,
) {
    let mut seq: u64 = 1;
    while let Some(mut env) = outbound.recv().await {
        env.seq = seq;
        seq += 1;
        env.timestamp = elapsed_ms(&start);

        let bytes = match state.codec.encode(&env) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode envelope");
                continue;
            }
        };
        if conn.send(&bytes).await.is_err() {
            break;
        }
    }
}

/// Sends an error envelope directly on the socket — the pre-attach
/// path, before a writer task exists.
async fn send_direct<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    code: u16,
    message: &str,
    start: &Instant,
) -> Result<(), DraftforgeError> {
    let env = Envelope {
        seq: 0,
        timestamp: elapsed_ms(start),
        payload: Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }),
    };
    let bytes = state.codec.encode(&env)?;
    conn.send(&bytes).await.map_err(DraftforgeError::Transport)
}

/// An envelope whose seq/timestamp the writer task will fill in.
fn envelope(payload: Payload) -> Envelope {
    Envelope {
        seq: 0,
        timestamp: 0,
        payload,
    }
}

fn error_envelope(code: u16, message: &str) -> Envelope {
    envelope(Payload::System(SystemMessage::Error {
        code,
        message: message.to_string(),
    }))
}

fn elapsed_ms(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
