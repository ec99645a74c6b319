//! Unified error type for the dodge server.

use dodge_protocol::ProtocolError;
use dodge_session::SessionError;
use dodge_sim::SimError;
use dodge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DodgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown or duplicate id).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An error raised while mutating the world.
    #[error(transparent)]
    Sim(#[from] SimError),
}
