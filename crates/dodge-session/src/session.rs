//! Session types: the server's record of one connected participant.
//!
//! A session carries everything the world needs to know about a player:
//! - WHO they are (id, name, colour)
//! - WHERE they are (position, velocity, current key state)
//! - HOW they stand in the match (alive, score, ready, solo-lobby flag)
//! - WHETHER a blast is currently pushing them around (knockback window)
//! - WHERE to send their messages (an outbox drained by a writer task)

use std::sync::Arc;

use dodge_protocol::PlayerId;
use tokio::sync::mpsc;

use crate::Rgb;

/// An encoded frame payload, shared between all recipients of a broadcast.
pub type Outbound = Arc<Vec<u8>>;

/// Channel for delivering encoded payloads to a connection's writer task.
///
/// Unbounded so that pushing from inside the world lock never waits on a
/// slow socket.
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// Longest display name kept, in characters.
pub const MAX_NAME_CHARS: usize = 32;

/// Name given to every connection until it sends one.
pub const DEFAULT_NAME: &str = "guest";

/// Horizontal key state as last reported by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

/// Knockback protection window.
///
/// While `now_ms < until_ms` input-driven horizontal control is ignored
/// and the player's centre is kept within `max_from_center` of
/// `origin_x`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Knockback {
    /// Simulation time (ms) at which protection ends.
    pub until_ms: f64,
    /// Blast centre x.
    pub origin_x: f32,
    /// Maximum horizontal distance of the player centre from `origin_x`.
    pub max_from_center: f32,
}

impl Knockback {
    /// Whether the window is still open at `now_ms`.
    pub fn is_active(&self, now_ms: f64) -> bool {
        now_ms < self.until_ms
    }
}

/// A single participant.
///
/// Created on accept, destroyed on disconnect. Fields are public because
/// the simulation mutates them directly under the world lock.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: PlayerId,
    pub name: String,
    pub color: Rgb,

    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub input: InputState,

    pub alive: bool,
    /// Points this round. Only grows between round resets.
    pub score: u32,
    /// Lobby ready toggle.
    pub ready: bool,
    /// Sitting out the running match in a personal lobby.
    pub left_to_lobby: bool,

    pub knockback: Knockback,

    outbox: Outbox,
}

impl Session {
    /// Creates a fresh, alive, not-ready session at the origin.
    pub fn new(id: PlayerId, color: Rgb, outbox: Outbox) -> Self {
        Self {
            id,
            name: DEFAULT_NAME.to_string(),
            color,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            input: InputState::default(),
            alive: true,
            score: 0,
            ready: false,
            left_to_lobby: false,
            knockback: Knockback::default(),
            outbox,
        }
    }

    /// Takes part in the current match (not in the solo lobby).
    pub fn is_active(&self) -> bool {
        !self.left_to_lobby
    }

    /// Queues a payload for this connection's writer.
    ///
    /// Returns `false` if the writer is gone; the reader's disconnect path
    /// removes the session shortly after, so callers just move on.
    pub fn send(&self, payload: &Outbound) -> bool {
        self.outbox.send(Arc::clone(payload)).is_ok()
    }

    /// A handle to this connection's outbox, for delivering a payload
    /// after the world lock has been released.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Replaces the display name. Blank names are ignored; long names are
    /// cut to [`MAX_NAME_CHARS`]. Returns whether the name changed.
    pub fn set_name(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        let name: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
        if name == self.name {
            return false;
        }
        self.name = name;
        true
    }

    /// Puts the player back on its start line with a clean slate for a
    /// new round.
    pub fn reset_for_round(&mut self, x: f32, y: f32) {
        self.alive = true;
        self.vx = 0.0;
        self.vy = 0.0;
        self.x = x;
        self.y = y;
        self.score = 0;
        self.knockback = Knockback::default();
    }
}
