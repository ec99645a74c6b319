//! Player motion, bounds, hit tests and obstacle advancement.

use dodge_session::Session;

use crate::config::GameConfig;
use crate::geometry::Rect;
use crate::knockback;
use crate::obstacle::{Obstacle, ObstacleKind};

/// Hit box scale applied to players.
pub const PLAYER_HITBOX_SCALE: f32 = 0.9;

/// Tolerance for standing on the ground line.
const GROUND_EPSILON: f32 = 0.5;

/// Whether the player rests on the ground line and may jump.
pub fn is_grounded(player: &Session, config: &GameConfig) -> bool {
    (player.y - config.player_ground_y()).abs() < GROUND_EPSILON
}

/// Advances one player by `dt` seconds.
///
/// Outside a knockback window the held keys set the horizontal velocity
/// and a grounded player may jump. Gravity always applies. After
/// integration the knockback leash and the world bounds are enforced.
pub fn step_player(player: &mut Session, config: &GameConfig, dt: f32, now_ms: f64) {
    let under_knockback = player.knockback.is_active(now_ms);

    if !under_knockback {
        player.vx = 0.0;
        if player.input.left {
            player.vx -= config.move_speed;
        }
        if player.input.right {
            player.vx += config.move_speed;
        }
        if player.input.up && is_grounded(player, config) {
            player.vy = -config.jump_velocity;
        }
    }
    player.vy += config.gravity * dt;

    player.x += player.vx * dt;
    player.y += player.vy * dt;

    if under_knockback {
        knockback::clamp_to_leash(player, config.player_width);
    }

    apply_bounds(player, config);
}

/// Keeps the player inside the horizontal margins and on or above the
/// ground, zeroing vertical speed on landing.
pub fn apply_bounds(player: &mut Session, config: &GameConfig) {
    let (left, right) = config.player_x_bounds();
    player.x = player.x.clamp(left, right);

    let ground = config.player_ground_y();
    if player.y >= ground {
        player.y = ground;
        player.vy = 0.0;
    }
}

pub fn player_rect(player: &Session, config: &GameConfig) -> Rect {
    Rect::new(player.x, player.y, config.player_width, config.player_height)
}

pub fn player_hitbox(player: &Session, config: &GameConfig) -> Rect {
    player_rect(player, config).deflate_around_center(PLAYER_HITBOX_SCALE, PLAYER_HITBOX_SCALE)
}

/// Whether a hit box overlaps any lethal obstacle.
pub fn touches_lethal(hitbox: &Rect, obstacles: &[Obstacle]) -> bool {
    obstacles
        .iter()
        .filter(|o| o.kind.is_lethal())
        .any(|o| hitbox.intersects(&o.hitbox()))
}

/// What happened to obstacles during one advancement pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AdvanceOutcome {
    /// Falling obstacles that left the bottom of the world.
    pub exited: u32,
    /// Horizontal centres of bombs that reached the ground this step.
    pub landed_bombs: Vec<f32>,
}

/// Moves every obstacle by one step and compacts the list.
///
/// Bombs reaching the ground line, expired explosions and obstacles below
/// the world are removed. Landings and exits are reported so the caller
/// can apply blasts and bonuses.
pub fn advance_obstacles(
    obstacles: &mut Vec<Obstacle>,
    config: &GameConfig,
    dt: f32,
    dt_ms: f64,
) -> AdvanceOutcome {
    let ground = config.ground_y();
    let exit_line = config.world_height + config.exit_margin;
    let mut outcome = AdvanceOutcome::default();

    obstacles.retain_mut(|ob| {
        ob.rect.y += ob.kind.fall_speed() * dt;

        match ob.kind {
            ObstacleKind::Bomb if ob.rect.bottom() >= ground => {
                outcome.landed_bombs.push(ob.rect.center_x());
                false
            }
            ObstacleKind::Explosion => {
                ob.life_ms -= dt_ms;
                ob.life_ms > 0.0
            }
            _ if ob.rect.top() > exit_line => {
                outcome.exited += 1;
                false
            }
            _ => true,
        }
    });

    outcome
}
