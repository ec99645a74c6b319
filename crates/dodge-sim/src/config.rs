//! Gameplay configuration.
//!
//! Every tunable number the simulation uses lives here. The defaults are
//! the shipped game; tests shrink or stretch individual values.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// World geometry, player motion, match pacing and the two nested tables
/// for the spawner and the knockback model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation rate in Hz, announced in `WELCOME`.
    pub tick_hz: u32,
    /// Broadcast rate in Hz, announced in `WELCOME`.
    pub snapshot_hz: u32,

    pub world_width: f32,
    pub world_height: f32,
    /// Horizontal inset of the playable area on both sides.
    pub world_margin: f32,
    /// Distance from the bottom of the world up to the ground line.
    pub ground_margin: f32,

    pub player_width: f32,
    pub player_height: f32,
    /// Downward acceleration, px/s².
    pub gravity: f32,
    /// Horizontal speed while a direction key is held, px/s.
    pub move_speed: f32,
    /// Upward speed given by a jump, px/s.
    pub jump_velocity: f32,

    /// Length of the pre-round countdown.
    pub countdown_ms: u32,
    /// Rounds played before the table goes back to the lobby.
    pub max_rounds: u32,

    /// How far below the world a falling obstacle must be to be removed.
    pub exit_margin: f32,
    /// Score given to every alive player when an obstacle leaves the world.
    pub exit_bonus: u32,

    pub spawn: SpawnConfig,
    pub knockback: KnockbackConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            snapshot_hz: 20,
            world_width: 900.0,
            world_height: 600.0,
            world_margin: 24.0,
            ground_margin: 84.0,
            player_width: 40.0,
            player_height: 40.0,
            gravity: 1200.0,
            move_speed: 320.0,
            jump_velocity: 520.0,
            countdown_ms: 3000,
            max_rounds: 3,
            exit_margin: 8.0,
            exit_bonus: 5,
            spawn: SpawnConfig::default(),
            knockback: KnockbackConfig::default(),
        }
    }
}

impl GameConfig {
    /// The ground line obstacles land on.
    pub fn ground_y(&self) -> f32 {
        self.world_height - self.ground_margin
    }

    /// Top edge of a player standing on the ground.
    pub fn player_ground_y(&self) -> f32 {
        self.ground_y() - self.player_height
    }

    /// Left edge of a player placed in the middle of the world.
    pub fn start_x(&self) -> f32 {
        self.world_width / 2.0 - self.player_width / 2.0
    }

    /// Leftmost and rightmost allowed player `x`.
    pub fn player_x_bounds(&self) -> (f32, f32) {
        (
            self.world_margin,
            self.world_width - self.world_margin - self.player_width,
        )
    }
}

// ---------------------------------------------------------------------------
// SpawnConfig
// ---------------------------------------------------------------------------

/// Obstacle spawner pacing.
///
/// Each falling kind has a base period and an unlock time measured from
/// the start of the round. Every `speedup_interval_ms` the periods shrink
/// by `speedup_factor`, never below `min_period_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub blade_period_ms: f64,
    pub flame_period_ms: f64,
    pub bomb_period_ms: f64,

    pub blade_unlock_ms: f64,
    pub flame_unlock_ms: f64,
    pub bomb_unlock_ms: f64,

    pub speedup_factor: f64,
    pub speedup_interval_ms: f64,
    pub min_period_ms: f64,
    /// Most obstacles of one kind emitted in a single step.
    pub max_per_step: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            blade_period_ms: 750.0,
            flame_period_ms: 600.0,
            bomb_period_ms: 750.0,
            blade_unlock_ms: 0.0,
            flame_unlock_ms: 10_000.0,
            bomb_unlock_ms: 20_000.0,
            speedup_factor: 1.2,
            speedup_interval_ms: 30_000.0,
            min_period_ms: 120.0,
            max_per_step: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// KnockbackConfig
// ---------------------------------------------------------------------------

/// Bomb blast tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnockbackConfig {
    /// Players whose centre is farther than this from the blast are untouched.
    pub radius: f32,
    pub horizontal_min: f32,
    pub horizontal_max: f32,
    pub up_kick: f32,
    /// Share of `horizontal_max` used for the radial vertical component.
    pub vertical_scale: f32,
    /// Length of the protection window.
    pub protect_ms: f64,
    pub max_vx: f32,
    pub max_vy: f32,
    /// Maximum distance from the blast centre, as a multiple of the
    /// explosion width.
    pub max_distance_factor: f32,
    /// Slack on the distance-derived speed cap.
    pub speed_safety: f32,
    /// How long the explosion effect stays in the world.
    pub explosion_life_ms: f64,
}

impl Default for KnockbackConfig {
    fn default() -> Self {
        Self {
            radius: 160.0,
            horizontal_min: 900.0,
            horizontal_max: 1800.0,
            up_kick: 160.0,
            vertical_scale: 0.15,
            protect_ms: 250.0,
            max_vx: 900.0,
            max_vy: 900.0,
            max_distance_factor: 2.0,
            speed_safety: 1.05,
            explosion_life_ms: 380.0,
        }
    }
}
