//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// When you see a `ProtocolError`, the problem is in
/// serialization/deserialization, not in networking or draft state.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong
    /// data types, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is well-formed but violates protocol rules —
    /// e.g., a hello with an unsupported version.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
