//! Error types for the protocol layer.

/// Errors that can occur while turning messages into bytes or back.
///
/// Transport problems (closed sockets, bad length prefixes) are not
/// represented here; by the time a payload reaches the codec it is a
/// complete frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `cmd`, or a
    /// field of the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but a value in it is unusable.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
