//! Core protocol types for Draftforge's wire format.
//!
//! Everything in this module gets serialized to bytes, sent over the
//! network, and deserialized on the other side — plus the handful of id
//! newtypes the rest of the workspace shares.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The opaque key that binds one participant to one draft.
///
/// A fresh v4 UUID (128 random bits) is generated per participant per
/// draft at draft-start time and never reused — even when the same person
/// drafts again. The key is the only credential a connection presents:
/// whoever holds it speaks as that participant, so it is shared with
/// exactly one client and never broadcast.
///
/// `#[serde(transparent)]` serializes this as the bare UUID string, not
/// as a wrapper object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantKey(uuid::Uuid);

impl ParticipantKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps an existing UUID (mainly for tests and parsing).
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for one draft session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DraftId(uuid::Uuid);

impl DraftId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "draft-{}", self.0)
    }
}

/// A participant's caller-supplied identity.
///
/// Opaque to the whole system — the coordinator never validates it
/// against any identity provider. Two drafters in the SAME draft must
/// not share a name; across drafts anything goes.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DrafterName(String);

impl DrafterName {
    /// Wraps a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrafterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DrafterName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A unique identifier for an item in a resource pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PoolItemId(pub u64);

impl fmt::Display for PoolItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pool items and packs
// ---------------------------------------------------------------------------

/// One draftable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolItem {
    /// Unique id within the pool.
    pub id: PoolItemId,
    /// Human-readable name, shown in clients.
    pub name: String,
}

/// A pack: the bundle of items currently in front of one drafter.
///
/// Packs shrink as picks are made and circulate around the rotation
/// ring until empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    /// The items still available in this pack.
    pub items: Vec<PoolItem>,
}

impl Pack {
    /// Returns `true` once every item has been picked.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items left.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

// ---------------------------------------------------------------------------
// SystemMessage — connection plumbing
// ---------------------------------------------------------------------------

/// Messages used for connection plumbing (not draft content).
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Hello", "version": 1, "key": "..." }` — the format the
/// client SDK expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: "here is my participant key."
    ///
    /// The first message on every connection. `version` lets the server
    /// reject incompatible clients before touching the registry.
    Hello {
        version: u32,
        key: ParticipantKey,
    },

    /// Server → Client: "key recognized, you are attached."
    HelloAck {
        draft_id: DraftId,
        name: DrafterName,
        server_time: u64,
    },

    /// Either direction: "I'm disconnecting."
    Disconnect { reason: String },

    /// Client → Server: keep-alive ping.
    Heartbeat { client_time: u64 },

    /// Server → Client: keep-alive echo with timing info.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    /// Server → Client: "something went wrong."
    /// `code` follows HTTP-style conventions (400 bad request,
    /// 404 unknown key, 409 invalid pick).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// DraftAction — client → server draft input
// ---------------------------------------------------------------------------

/// An action a drafter takes, sent client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DraftAction {
    /// Pick one item out of the pack currently in front of the drafter.
    Pick { item: PoolItemId },
}

// ---------------------------------------------------------------------------
// DraftMessage — server → client draft events
// ---------------------------------------------------------------------------

/// A draft event, sent server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DraftMessage {
    /// A new pack is in front of you — pick an item.
    PackPresented { pack: Pack },

    /// Your pick was recorded.
    PickRecorded { item: PoolItem },

    /// Another drafter made their pick (names only, never their pick).
    DrafterPicked { name: DrafterName },

    /// A new round of packs has been dealt.
    RoundStarted { round: u32 },

    /// The draft is over; here is everything you picked.
    DraftCompleted { picks: Vec<PoolItem> },
}

// ---------------------------------------------------------------------------
// Payload / Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The content of a message.
///
/// Externally tagged JSON, e.g.
/// `{ "Event": { "type": "PackPresented", ... } }`. The outer tag lets
/// the handler route without inspecting the inner message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Connection plumbing (hello, heartbeat, errors).
    System(SystemMessage),

    /// Client → server draft input.
    Action(DraftAction),

    /// Server → client draft events.
    Event(DraftMessage),
}

/// The top-level message wrapper. Every message on the wire is an Envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing sequence number; each side keeps its own counter.
    pub seq: u64,

    /// Milliseconds since the sender's connection was established.
    pub timestamp: u64,

    /// The actual message content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
