//! Wire protocol for the dodge server.
//!
//! - **Types** ([`ClientCommand`], [`ServerMessage`], [`Snapshot`], ...):
//!   the JSON objects that travel inside each frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those objects are
//!   converted to and from frame payloads.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (ClientCommand / ServerMessage) → Simulation
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientCommand, LobbyPlayer, LobbyState, MatchTotal, Phase, PlayerId,
    ServerMessage, Snapshot, SnapshotObstacle, SnapshotPlayer,
};
