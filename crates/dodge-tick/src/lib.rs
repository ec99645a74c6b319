//! Fixed-timestep tick scheduler for the dodge server.
//!
//! Two loops in the server run on a clock: the simulation (60 Hz) and the
//! snapshot broadcaster (20 Hz). Both use a [`TickScheduler`]; the
//! simulation additionally cares about [`TickInfo::steps`], which tells it
//! how many fixed steps of real time have accumulated since the last wake.
//!
//! # Fixed steps
//!
//! The scheduler measures real elapsed time between wakes and feeds it to
//! a [`FixedStep`] accumulator. Each whole step's worth of time becomes one
//! simulation step with a constant `dt`, so game physics never sees a
//! variable delta. A late wake yields more than one step, up to
//! `max_catchup`; any backlog beyond that is discarded with a warning.
//!
//! # Integration
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::with_rate(60));
//! loop {
//!     let info = scheduler.wait_for_tick().await;
//!     for _ in 0..info.steps {
//!         world.step(info.dt);
//!     }
//!     scheduler.record_tick_end();
//! }
//! ```

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. Clamped to `1..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    /// Most fixed steps handed out by a single wake. A stall longer than
    /// this many ticks loses the excess time instead of replaying it.
    pub max_catchup: u32,
    /// Budget warning threshold (0.0–1.0). Default: 0.80 (80%).
    /// A tracing warning is emitted when tick execution exceeds this
    /// fraction of the tick budget.
    pub budget_warn_threshold: f64,
    /// Budget critical threshold (0.0–1.0). Default: 1.0 (100%).
    pub budget_critical_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_catchup: 5,
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 240;

    /// Create a config for a specific tick rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. Rules:
    /// - `tick_rate_hz` clamped to `1..=MAX_TICK_RATE_HZ`.
    /// - `max_catchup` at least 1.
    /// - Thresholds clamped to `0.0..=1.0`, warn ≤ critical.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz == 0 || self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.max_catchup = self.max_catchup.max(1);
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }

    /// Duration of a single tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Fixed-step accumulator
// ---------------------------------------------------------------------------

/// Turns measured wall time into a whole number of fixed steps.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulated: Duration,
    max_steps: u32,
}

impl FixedStep {
    pub fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            step,
            accumulated: Duration::ZERO,
            max_steps: max_steps.max(1),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Time carried over that has not yet made up a whole step.
    pub fn backlog(&self) -> Duration {
        self.accumulated
    }

    /// Adds `elapsed` and returns how many steps to run now.
    ///
    /// Never returns more than `max_steps`. When more time is owed than
    /// that, the surplus whole steps are dropped and only the fractional
    /// remainder is kept.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.step.is_zero() {
            return 0;
        }
        self.accumulated += elapsed;

        let mut steps = 0;
        while self.accumulated >= self.step && steps < self.max_steps {
            self.accumulated -= self.step;
            steps += 1;
        }

        if self.accumulated >= self.step {
            let step_nanos = self.step.as_nanos();
            let dropped = self.accumulated.as_nanos() / step_nanos;
            warn!(
                dropped,
                max_steps = self.max_steps,
                "simulation fell behind, dropping steps"
            );
            self.accumulated = Duration::from_nanos((self.accumulated.as_nanos() % step_nanos) as u64);
        }

        steps
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a completed wake, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing wake number (starts at 1).
    pub tick: u64,
    /// Fixed delta time of one step (always `1 / tick_rate`).
    pub dt: Duration,
    /// Whole steps of real time owed since the previous wake. Usually 1;
    /// 0 or more than 1 when the runtime woke early or late.
    pub steps: u32,
    /// `true` if this wake fired more than 10% of a tick late.
    pub overrun: bool,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep tick scheduler.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: TokioInstant,
    last_wake: TokioInstant,
    accumulator: FixedStep,
    /// Wall-clock instant when the last tick's work started.
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
}

impl TickScheduler {
    /// Create a new scheduler. The first tick fires one period from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        let now = TokioInstant::now();

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            max_catchup = config.max_catchup,
            "tick scheduler created"
        );

        Self {
            accumulator: FixedStep::new(tick_duration, config.max_catchup),
            config,
            tick_duration,
            tick_count: 0,
            next_tick: now + tick_duration,
            last_wake: now,
            tick_start: None,
        }
    }

    /// Create a scheduler for a specific tick rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Wait until the next tick is due. Returns [`TickInfo`] for the tick.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = self.next_tick;
        let tick_dur = self.tick_duration;

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        let elapsed = now.saturating_duration_since(self.last_wake);
        self.last_wake = now;
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > tick_dur / 10;

        // A whole period late: re-anchor on now rather than firing a burst
        // of back-to-back wakes. The accumulator still owes the lost time.
        self.next_tick = if late_by >= tick_dur {
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, rescheduling from now"
            );
            now + tick_dur
        } else {
            next + tick_dur
        };

        let steps = self.accumulator.advance(elapsed);

        trace!(tick = self.tick_count, steps, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: tick_dur,
            steps,
            overrun,
        }
    }

    /// Record that the work for the current tick has finished.
    ///
    /// Emits a budget warning if the work took too large a share of the
    /// tick period. Does nothing without a preceding `wait_for_tick`.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();

        if utilization >= self.config.budget_critical_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.tick_duration.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "CRITICAL: tick exceeded budget"
            );
        } else if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.tick_duration.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget limit"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Number of wakes so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
