//! Authoritative world simulation for the dodge server.
//!
//! The [`World`] advances in fixed steps and reacts to decoded client
//! commands. Inside it:
//!
//! - the match state machine ([`MatchState`]): Lobby → Countdown →
//!   Playing → AwaitingRestart, with restart votes and match totals
//! - the [`Spawner`]: time-gated obstacle kinds, anti-burst lanes
//! - physics: player motion, bounds, shrunken hit boxes, obstacle fall
//! - knockback: bomb blasts with a protected, leashed push window
//! - snapshot building for `LOBBY` and `SNAPSHOT` payloads
//!
//! # Key types
//!
//! - [`World`]: the single shared state the server locks
//! - [`GameConfig`]: every gameplay constant
//! - [`BroadcastFrame`]: an encoded snapshot plus its recipients

mod config;
mod error;
mod geometry;
pub mod knockback;
mod obstacle;
mod phase;
pub mod physics;
mod snapshot;
mod spawner;
mod world;

pub use config::{GameConfig, KnockbackConfig, SpawnConfig};
pub use error::SimError;
pub use geometry::Rect;
pub use obstacle::{Obstacle, ObstacleKind};
pub use phase::MatchState;
pub use snapshot::BroadcastFrame;
pub use spawner::Spawner;
pub use world::World;
