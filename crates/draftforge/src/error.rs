//! Unified error type for the Draftforge server.

use draftforge_coordinator::CoordinatorError;
use draftforge_draft::DraftError;
use draftforge_protocol::ProtocolError;
use draftforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `draftforge` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DraftforgeError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A coordinator-level error (malformed start_draft input).
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// A draft-level error (invalid pick, draft gone).
    #[error(transparent)]
    Draft(#[from] DraftError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: DraftforgeError = err.into();
        assert!(matches!(top, DraftforgeError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: DraftforgeError = err.into();
        assert!(matches!(top, DraftforgeError::Protocol(_)));
    }

    #[test]
    fn test_from_coordinator_error() {
        let err = CoordinatorError::EmptyDraft;
        let top: DraftforgeError = err.into();
        assert!(matches!(top, DraftforgeError::Coordinator(_)));
    }

    #[test]
    fn test_from_draft_error() {
        let err = DraftError::NoPackQueued;
        let top: DraftforgeError = err.into();
        assert!(matches!(top, DraftforgeError::Draft(_)));
    }
}
