//! Obstacle spawner.
//!
//! Each falling kind runs in its own lane with a millisecond accumulator.
//! The lane rules keep the spawn rate smooth:
//!
//! - A locked lane banks nothing; its accumulator stays at zero.
//! - On the step a lane unlocks it starts from an empty accumulator.
//! - When the speed-up schedule changes a lane's period, the banked time
//!   is rescaled to the new period and kept below one full period.
//! - A lane emits at most `max_per_step` obstacles per step; leftover
//!   banked time carries over.
//!
//! Horizontal positions come from a ChaCha RNG seeded with the process
//! seed and reseeded at every round reset, so a round replays the same
//! sequence given the same timing.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{GameConfig, SpawnConfig};
use crate::obstacle::{Obstacle, ObstacleKind};

#[derive(Debug, Clone)]
struct Lane {
    kind: ObstacleKind,
    base_period_ms: f64,
    unlock_at_ms: f64,
    acc_ms: f64,
    prev_period_ms: f64,
    was_unlocked: bool,
}

impl Lane {
    fn new(kind: ObstacleKind, base_period_ms: f64, unlock_at_ms: f64) -> Self {
        Self {
            kind,
            base_period_ms,
            unlock_at_ms,
            acc_ms: 0.0,
            prev_period_ms: base_period_ms,
            was_unlocked: false,
        }
    }

    fn reset(&mut self) {
        self.acc_ms = 0.0;
        self.prev_period_ms = self.base_period_ms;
        self.was_unlocked = false;
    }
}

/// Decides, step by step, which obstacles enter the world.
#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnConfig,
    seed: u64,
    rng: ChaCha8Rng,
    /// Lanes in emission order. The order is part of the reproducible
    /// sequence: positions are drawn lane by lane.
    lanes: [Lane; 3],
    x_min: f32,
    x_right: f32,
}

impl Spawner {
    pub fn new(config: &GameConfig, seed: u32) -> Self {
        let spawn = config.spawn.clone();
        let lanes = [
            Lane::new(ObstacleKind::Blade, spawn.blade_period_ms, spawn.blade_unlock_ms),
            Lane::new(ObstacleKind::Flame, spawn.flame_period_ms, spawn.flame_unlock_ms),
            Lane::new(ObstacleKind::Bomb, spawn.bomb_period_ms, spawn.bomb_unlock_ms),
        ];
        Self {
            config: spawn,
            seed: u64::from(seed),
            rng: ChaCha8Rng::seed_from_u64(u64::from(seed)),
            lanes,
            x_min: config.world_margin,
            x_right: config.world_width - config.world_margin,
        }
    }

    /// Clears every lane and reseeds the position RNG.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        for lane in &mut self.lanes {
            lane.reset();
        }
    }

    /// Global rate multiplier: `speedup_factor` raised to the number of
    /// whole speed-up intervals elapsed.
    pub fn speed_scale(&self, elapsed_ms: f64) -> f64 {
        let stages = (elapsed_ms.max(0.0) / self.config.speedup_interval_ms).floor();
        self.config.speedup_factor.powf(stages)
    }

    /// Period actually used for a lane with `base_ms` at `elapsed_ms`.
    pub fn effective_period(&self, base_ms: f64, elapsed_ms: f64) -> f64 {
        (base_ms / self.speed_scale(elapsed_ms)).max(self.config.min_period_ms)
    }

    /// Kinds the spawner may emit at `elapsed_ms` into the round. Never
    /// shrinks as `elapsed_ms` grows.
    pub fn unlocked_kinds(&self, elapsed_ms: f64) -> Vec<ObstacleKind> {
        self.lanes
            .iter()
            .filter(|lane| elapsed_ms >= lane.unlock_at_ms)
            .map(|lane| lane.kind)
            .collect()
    }

    /// Advances every lane by `dt_ms` and returns the obstacles to add.
    pub fn tick(&mut self, elapsed_ms: f64, dt_ms: f64) -> Vec<Obstacle> {
        let scale = self.speed_scale(elapsed_ms);
        let min_period = self.config.min_period_ms;
        let max_per_step = self.config.max_per_step;
        let mut out = Vec::new();

        for i in 0..self.lanes.len() {
            let lane = &mut self.lanes[i];
            let unlocked = elapsed_ms >= lane.unlock_at_ms;
            let period = (lane.base_period_ms / scale).max(min_period);

            if unlocked {
                if !lane.was_unlocked {
                    lane.acc_ms = 0.0;
                    lane.prev_period_ms = period;
                }
                lane.acc_ms += dt_ms;
            } else {
                lane.acc_ms = 0.0;
            }

            if period != lane.prev_period_ms {
                lane.acc_ms = (lane.acc_ms * period / lane.prev_period_ms).min(period - 1.0);
                lane.prev_period_ms = period;
            }
            lane.was_unlocked = unlocked;

            if !unlocked {
                continue;
            }

            let kind = lane.kind;
            let mut emitted = 0;
            while self.lanes[i].acc_ms >= period && emitted < max_per_step {
                self.lanes[i].acc_ms -= period;
                let obstacle = self.spawn(kind);
                tracing::trace!(?kind, x = obstacle.rect.x, elapsed_ms, "obstacle spawned");
                out.push(obstacle);
                emitted += 1;
            }
        }

        out
    }

    fn spawn(&mut self, kind: ObstacleKind) -> Obstacle {
        let (w, _) = kind.size();
        let hi = self.x_right - w;
        let x = if hi > self.x_min {
            self.rng.random_range(self.x_min..hi)
        } else {
            self.x_min
        };
        Obstacle::falling(kind, x)
    }
}
