//! Error types for the simulation layer.

use dodge_protocol::ProtocolError;
use dodge_session::SessionError;

/// Errors that can occur while mutating the world.
///
/// Out-of-phase commands are not errors; they are ignored inside
/// [`World::apply`](crate::World::apply).
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A message for clients could not be encoded.
    #[error("failed to encode outbound message: {0}")]
    Protocol(#[from] ProtocolError),

    /// The command or departure named a session that is not registered.
    #[error(transparent)]
    Session(#[from] SessionError),
}
