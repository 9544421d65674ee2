//! Draft session state machine for Draftforge.
//!
//! Each draft runs as an isolated Tokio task (actor model) owning the
//! packs, the pick history, and the turn rotation. The outside world
//! talks to it through a [`DraftHandle`]; the draft talks back through a
//! shared [`DraftEvent`] channel. Crucially, the draft knows NOTHING
//! about network connections or the coordinator's registry — it
//! addresses participants only by their [`ParticipantKey`]
//! (draftforge_protocol::ParticipantKey).
//!
//! # Key types
//!
//! - [`spawn_draft`] / [`DraftHandle`] — create and command a draft actor
//! - [`DraftEvent`] — outbound messages and the completion signal
//! - [`Drafter`] — one participant record (name + key)
//! - [`ResourcePool`] — the item pool being drafted
//! - [`DraftConfig`] / [`DraftState`] — settings and lifecycle

#![allow(async_fn_in_trait)]

mod config;
mod draft;
mod error;
mod pool;

pub use config::{DraftConfig, DraftState};
pub use draft::{
    DraftEvent, DraftEventSender, DraftHandle, DraftInfo, ResyncInfo,
    spawn_draft,
};
pub use error::DraftError;
pub use pool::{Drafter, ResourcePool};
