//! Bomb blasts: the explosion effect and the radial push it gives players.
//!
//! A blast sets each nearby player's velocity directly and opens a short
//! protection window. During the window the player ignores its keys and
//! is kept on a leash: its centre may not drift farther than
//! `max_from_center` from the blast origin. The horizontal speed is also
//! capped up front so that covering the whole window at that speed stays
//! inside the leash.

use dodge_session::{Knockback, Session};

use crate::config::GameConfig;
use crate::obstacle::{Obstacle, ObstacleKind};

/// Avoids a division by zero for a player centred exactly on the blast.
const DIST_EPSILON: f32 = 1e-3;

/// The explosion effect left by a bomb landing at `(cx, cy)`.
pub fn explosion(cx: f32, cy: f32, config: &GameConfig) -> Obstacle {
    Obstacle::explosion(cx, cy, config.knockback.explosion_life_ms)
}

/// Largest allowed horizontal distance between a pushed player's centre
/// and the blast origin.
pub fn max_from_center(config: &GameConfig) -> f32 {
    let (w, _) = ObstacleKind::Explosion.size();
    w * config.knockback.max_distance_factor
}

/// Pushes every alive player within the blast radius of `(cx, cy)`.
/// Returns how many players were hit.
pub fn apply_blast<'a>(
    players: impl Iterator<Item = &'a mut Session>,
    cx: f32,
    cy: f32,
    config: &GameConfig,
    now_ms: f64,
) -> usize {
    let kb = &config.knockback;
    let leash = max_from_center(config);
    let protect_s = (kb.protect_ms as f32 / 1000.0).max(0.001);
    let mut hit = 0;

    for p in players.filter(|p| p.alive) {
        let px = p.x + config.player_width / 2.0;
        let py = p.y + config.player_height / 2.0;
        let dx = px - cx;
        let dy = py - cy;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > kb.radius {
            continue;
        }

        let weight = 1.0 - dist / kb.radius;

        let dir_x = if dx >= 0.0 { 1.0 } else { -1.0 };
        let remaining = (leash - dx.abs()).max(0.0);
        let speed_cap = remaining / protect_s * kb.speed_safety;
        let vx = (dir_x * kb.horizontal_min.max(kb.horizontal_max * weight))
            .clamp(-speed_cap, speed_cap);

        let ny = dy / (dist + DIST_EPSILON);
        let vy = p.vy.min(0.0) - kb.up_kick * (0.5 + 0.5 * weight)
            + ny * (kb.horizontal_max * kb.vertical_scale * weight);

        p.vx = vx.clamp(-kb.max_vx, kb.max_vx);
        p.vy = vy.clamp(-kb.max_vy, kb.max_vy);
        p.knockback = Knockback {
            until_ms: now_ms + kb.protect_ms,
            origin_x: cx,
            max_from_center: leash,
        };
        hit += 1;

        tracing::debug!(player_id = %p.id, dist, vx = p.vx, vy = p.vy, "knockback applied");
    }

    hit
}

/// Pulls a player back onto its knockback leash, stopping its horizontal
/// motion if it had to be moved.
pub fn clamp_to_leash(player: &mut Session, player_width: f32) {
    let kb = player.knockback;
    if kb.max_from_center <= 0.0 {
        return;
    }
    let center = player.x + player_width / 2.0;
    let offset = center - kb.origin_x;
    if offset.abs() > kb.max_from_center {
        let clamped = kb.origin_x + offset.signum() * kb.max_from_center;
        player.x = clamped - player_width / 2.0;
        player.vx = 0.0;
    }
}
