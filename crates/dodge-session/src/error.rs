//! Error types for the session layer.

use dodge_protocol::PlayerId;

/// Errors raised by the [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. Happens when a late
    /// command or a second disconnect races the first removal.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// A session with this id is already registered.
    #[error("player {0} already has an active session")]
    AlreadyConnected(PlayerId),
}
