//! # dodge-server
//!
//! Authoritative server for a multiplayer side-view dodge game.
//!
//! Clients connect over TCP, send length-prefixed JSON commands and
//! receive `WELCOME`, `LOBBY` and `SNAPSHOT` payloads in return. The
//! server runs a fixed-rate simulation over a single shared [`World`]
//! and broadcasts snapshots at a lower fixed rate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dodge_server::DodgeServer;
//!
//! # async fn start() -> Result<(), dodge_server::DodgeError> {
//! let server = DodgeServer::builder().bind("0.0.0.0:5055").build().await?;
//! server.run().await
//! # }
//! ```
//!
//! [`World`]: dodge_sim::World

mod error;
mod handler;
mod server;
mod tasks;

pub use error::DodgeError;
pub use server::{DEFAULT_BIND_ADDR, DodgeServer, DodgeServerBuilder};

/// Re-exports of the types a server embedder or test client needs.
pub mod prelude {
    pub use crate::{DodgeError, DodgeServer, DodgeServerBuilder};
    pub use dodge_protocol::{
        ClientCommand, Codec, JsonCodec, LobbyState, Phase, PlayerId, ServerMessage, Snapshot,
    };
    pub use dodge_sim::{GameConfig, KnockbackConfig, SpawnConfig};
}
