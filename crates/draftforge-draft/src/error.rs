//! Error types for the draft layer.

use draftforge_protocol::{DraftId, ParticipantKey, PoolItemId};

/// Errors that can occur while commanding a draft.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// The draft is not currently accepting picks (not started yet, or
    /// already finished).
    #[error("draft {0} is not active")]
    NotActive(DraftId),

    /// The key does not belong to any seat of this draft.
    #[error("participant {0} is not part of this draft")]
    UnknownDrafter(ParticipantKey),

    /// The drafter has no pack in front of them — they picked already
    /// and are waiting for the next pack to arrive.
    #[error("no pack queued for this drafter")]
    NoPackQueued,

    /// The requested item is not in the pack in front of the drafter.
    /// Stale client state, or a forged pick.
    #[error("item {0} is not in the current pack")]
    ItemNotInPack(PoolItemId),

    /// The draft's command channel is closed — the actor is gone.
    #[error("draft {0} is unavailable")]
    Unavailable(DraftId),
}
