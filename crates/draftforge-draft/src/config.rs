//! Draft configuration and lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DraftConfig
// ---------------------------------------------------------------------------

/// Configuration for one draft instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DraftConfig {
    /// Items per pack.
    pub pack_size: usize,

    /// Rounds of packs each drafter opens. Pack passing alternates
    /// direction each round.
    pub rounds: u32,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            pack_size: 15,
            rounds: 3,
        }
    }
}

impl DraftConfig {
    /// Total items the deal consumes for `drafters` participants.
    ///
    /// The pool must hold at least this many items; any surplus stays
    /// undrafted.
    pub fn items_needed(&self, drafters: usize) -> usize {
        drafters * self.rounds as usize * self.pack_size
    }
}

// ---------------------------------------------------------------------------
// DraftState
// ---------------------------------------------------------------------------

/// The lifecycle state of a draft.
///
/// ```text
/// Pending ──(start)──→ Drafting ──(last pick)──→ Finished
/// ```
///
/// - **Pending**: actor spawned and registered, packs not yet dealt.
///   This is the window in which the coordinator registers slots before
///   sending Start — no pick can sneak in ahead of registration.
/// - **Drafting**: packs dealt, picks being made.
/// - **Finished**: pool consumed; the completion signal has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftState {
    Pending,
    Drafting,
    Finished,
}

impl DraftState {
    /// Returns `true` while picks are being accepted.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Drafting)
    }

    /// Returns `true` once the draft has run to completion.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for DraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Drafting => write!(f, "Drafting"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
