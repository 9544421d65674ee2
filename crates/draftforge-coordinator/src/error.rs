//! Error types for the coordinator.

use draftforge_draft::DraftError;
use draftforge_protocol::DrafterName;

/// Errors that can occur when creating a draft.
///
/// Note what is NOT here: an unknown participant key is a legitimate
/// `None` from [`DraftCoordinator::slot`](crate::DraftCoordinator::slot),
/// and completing or disconnecting something already gone is a silent
/// no-op. Only malformed `start_draft` input is an error.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// `start_draft` was called with no participants.
    #[error("a draft needs at least one participant")]
    EmptyDraft,

    /// The same identity appeared twice in one `start_draft` call.
    /// Allowing it would seat one person twice and alias their picks.
    #[error("duplicate participant {0} in draft request")]
    DuplicateDrafter(DrafterName),

    /// The pool cannot cover the configured deal.
    #[error("pool holds {have} items but the deal needs {needed}")]
    PoolTooSmall { needed: usize, have: usize },

    /// The draft actor rejected or never received its Start command.
    /// The registration has already been rolled back when this is
    /// returned.
    #[error("draft failed to start: {0}")]
    StartFailed(#[source] DraftError),
}
