//! Slot types: the registry records binding participants to drafts and
//! live connections.

use draftforge_draft::{DraftHandle, Drafter};
use draftforge_protocol::Envelope;
use draftforge_transport::ConnectionId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// The coordinator's view of one live connection: an outbound message
/// sender tagged with the connection's id.
///
/// Cheap to clone — it's an `mpsc::UnboundedSender` wrapper. The id is
/// allocated by the transport from a monotonic counter, so it doubles as
/// a reconnect generation number: of two handles for the same
/// participant, the one with the larger id is the fresher attachment.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Envelope>,
}

impl ConnectionHandle {
    /// Pairs a connection id with its outbound channel.
    pub fn new(
        id: ConnectionId,
        sender: mpsc::UnboundedSender<Envelope>,
    ) -> Self {
        Self { id, sender }
    }

    /// The transport-assigned connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues an envelope for delivery on this connection.
    ///
    /// Returns `false` if the connection's writer is gone (socket
    /// closed under us) — the message is dropped, never an error.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.sender.send(envelope).is_ok()
    }
}

// ---------------------------------------------------------------------------
// DraftSlot
// ---------------------------------------------------------------------------

/// One registry record: a participant, the draft they belong to, and
/// the connection currently speaking for them (if any).
///
/// Slots are owned by the coordinator's registry; callers receive cloned
/// snapshots. A snapshot taken before a draft was removed is
/// semantically stale — re-resolve through
/// [`DraftCoordinator::slot`](crate::DraftCoordinator::slot) before
/// acting on one you have held across an await point.
///
/// Identity is the (draft, participant) pair; the attached connection
/// comes and goes without changing which slot this is.
#[derive(Clone)]
pub struct DraftSlot {
    draft: DraftHandle,
    drafter: Drafter,
    connection: Option<ConnectionHandle>,
}

impl DraftSlot {
    /// Creates a detached slot (no connection yet).
    pub(crate) fn new(draft: DraftHandle, drafter: Drafter) -> Self {
        Self {
            draft,
            drafter,
            connection: None,
        }
    }

    /// The draft this participant belongs to.
    pub fn draft(&self) -> &DraftHandle {
        &self.draft
    }

    /// The participant record (name + key).
    pub fn drafter(&self) -> &Drafter {
        &self.drafter
    }

    /// The attached connection, if a live one exists.
    pub fn connection(&self) -> Option<&ConnectionHandle> {
        self.connection.as_ref()
    }

    /// Attaches a connection, replacing any previous one.
    pub(crate) fn attach(&mut self, connection: ConnectionHandle) {
        self.connection = Some(connection);
    }

    /// Detaches the connection, if any.
    pub(crate) fn detach(&mut self) {
        self.connection = None;
    }
}

impl PartialEq for DraftSlot {
    fn eq(&self, other: &Self) -> bool {
        self.draft.draft_id() == other.draft.draft_id()
            && self.drafter.key() == other.drafter.key()
    }
}

impl Eq for DraftSlot {}

impl std::fmt::Debug for DraftSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSlot")
            .field("draft", &self.draft.draft_id())
            .field("drafter", &self.drafter.name())
            .field(
                "connection",
                &self.connection.as_ref().map(|c| c.id()),
            )
            .finish()
    }
}
