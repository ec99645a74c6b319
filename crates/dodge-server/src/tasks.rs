//! The two background tasks that share the world with connection handlers.
//!
//! The simulation task takes the world lock once per fixed step, so
//! commands can land between catch-up steps. The broadcaster holds it
//! only while encoding a snapshot; delivery into the session outboxes
//! happens after the lock is released.

use std::sync::Arc;

use dodge_tick::{TickInfo, TickScheduler};

use crate::server::ServerState;

/// Advances the world at `tick_hz`, forever.
///
/// Each wake runs as many fixed steps as the scheduler reports; a late
/// wake catches up (up to the scheduler's cap) instead of stretching `dt`.
pub(crate) async fn run_simulation(state: Arc<ServerState>, tick_hz: u32) {
    let mut scheduler = TickScheduler::with_rate(tick_hz);
    tracing::debug!(hz = scheduler.tick_rate_hz(), "simulation task started");

    loop {
        let info = scheduler.wait_for_tick().await;
        run_steps(&state, &info).await;
        scheduler.record_tick_end();
    }
}

/// Runs the steps owed by one wake, locking the world for each step
/// separately.
async fn run_steps(state: &ServerState, info: &TickInfo) {
    for _ in 0..info.steps {
        let result = state.world.lock().await.step(info.dt);
        if let Err(e) = result {
            tracing::warn!(tick = info.tick, error = %e, "simulation step failed");
        }
    }
}

/// Sends the periodic snapshot at `snapshot_hz`, forever.
///
/// Idle in the lobby, where rosters are pushed on events instead. Logs a
/// summary at `debug` roughly once per second.
pub(crate) async fn run_broadcaster(state: Arc<ServerState>, snapshot_hz: u32) {
    let mut scheduler = TickScheduler::with_rate(snapshot_hz);
    let summary_every = u64::from(scheduler.tick_rate_hz());
    let mut frames = 0u32;
    let mut deliveries = 0usize;

    loop {
        let info = scheduler.wait_for_tick().await;

        let (phase, connected, frame) = {
            let world = state.world.lock().await;
            (world.phase(), world.sessions().len(), world.snapshot_frame())
        };

        match frame {
            Ok(Some(frame)) => {
                deliveries += frame.deliver();
                frames += 1;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to encode snapshot"),
        }

        if info.tick % summary_every == 0 {
            tracing::debug!(%phase, connected, frames, deliveries, "broadcast summary");
            frames = 0;
            deliveries = 0;
        }
    }
}
