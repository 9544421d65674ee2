//! Wire protocol for Draftforge.
//!
//! This crate defines the "language" that drafting clients and the server
//! speak:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`DraftAction`],
//!   [`DraftMessage`], the id newtypes) — the structures that travel on
//!   the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the
//! coordinator (participant context). It doesn't know about connections
//! or drafts — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Coordinator (participant context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    DraftAction, DraftId, DraftMessage, DrafterName, Envelope, Pack,
    ParticipantKey, Payload, PoolItem, PoolItemId, SystemMessage,
};
