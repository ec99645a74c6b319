//! Match state machine.
//!
//! ```text
//!            all active ready            countdown done
//!   Lobby ─────────────────────▶ Countdown ─────────────▶ Playing
//!     ▲                              ▲                       │
//!     │ round cap reached            │ all active voted      │ nobody alive
//!     └──────────────────────── AwaitingRestart ◀────────────┘
//! ```
//!
//! Any phase drops straight back to Lobby when the last active session
//! goes away. Every transition clears the restart votes and is announced
//! at once: a `LOBBY` payload for Lobby, a `SNAPSHOT` otherwise.

use std::collections::{BTreeMap, BTreeSet};

use dodge_protocol::{MatchTotal, Phase, PlayerId};
use tracing::info;

use crate::{SimError, World};

/// Phase, round bookkeeping and restart votes.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub phase: Phase,
    /// Current round of the match; 0 while waiting for the first game.
    pub round: u32,
    pub countdown_ms: f64,
    pub round_elapsed_ms: f64,
    pub votes: BTreeSet<PlayerId>,
    /// Running score per player across the rounds of this match.
    pub totals: BTreeMap<PlayerId, MatchTotal>,
}

impl MatchState {
    /// Moves to `next`, clearing votes. Entering Playing restarts the
    /// round clock.
    fn transition(&mut self, next: Phase) {
        info!(from = %self.phase, to = %next, round = self.round, "phase change");
        self.phase = next;
        self.votes.clear();
        if next == Phase::Playing {
            self.round_elapsed_ms = 0.0;
        }
    }
}

impl World {
    /// Lobby → Countdown, when at least one active session exists and all
    /// of them are ready. A new match starts at round 1 with fresh totals.
    pub(crate) fn try_start_countdown(&mut self) -> Result<(), SimError> {
        if self.state.phase != Phase::Lobby || !self.sessions.all_active_ready() {
            return Ok(());
        }
        self.state.round = 1;
        self.state.totals.clear();
        info!(players = self.sessions.active_count(), "everyone ready, match starting");
        self.start_countdown()
    }

    /// Resets the round and enters Countdown.
    ///
    /// Clears obstacles, spawner lanes and the tick counter, reseeds the
    /// spawn sequence and puts every active player back on the start line.
    pub(crate) fn start_countdown(&mut self) -> Result<(), SimError> {
        self.state.transition(Phase::Countdown);
        self.state.countdown_ms = f64::from(self.config.countdown_ms);
        self.state.round_elapsed_ms = 0.0;
        self.obstacles.clear();
        self.spawner.reset();
        self.tick = 0;

        let (x, y) = (self.config.start_x(), self.config.player_ground_y());
        for player in self.sessions.active_mut() {
            player.reset_for_round(x, y);
        }

        info!(round = self.state.round, "round countdown");
        self.broadcast_phase()
    }

    /// Countdown → Playing.
    pub(crate) fn begin_playing(&mut self) -> Result<(), SimError> {
        self.state.countdown_ms = 0.0;
        self.state.transition(Phase::Playing);
        info!(round = self.state.round, "round start");
        self.broadcast_phase()
    }

    /// Playing → AwaitingRestart. Round scores are folded into the match
    /// totals.
    pub(crate) fn end_round(&mut self) -> Result<(), SimError> {
        for player in self.sessions.active() {
            let entry = self.state.totals.entry(player.id).or_insert_with(|| MatchTotal {
                id: player.id,
                name: player.name.clone(),
                total: 0,
            });
            entry.name.clone_from(&player.name);
            entry.total += u64::from(player.score);
        }
        self.state.transition(Phase::AwaitingRestart);
        info!(round = self.state.round, "all players down, waiting for restart votes");
        self.broadcast_phase()
    }

    /// Records a restart vote. Ignored outside AwaitingRestart and from
    /// sessions sitting in their solo lobby.
    pub(crate) fn register_vote(&mut self, id: PlayerId) -> Result<(), SimError> {
        if self.state.phase != Phase::AwaitingRestart {
            return Ok(());
        }
        if !self.sessions.get(&id).is_some_and(|s| s.is_active()) {
            return Ok(());
        }
        if self.state.votes.insert(id) {
            info!(
                player_id = %id,
                votes = self.state.votes.len(),
                needed = self.sessions.active_count(),
                "restart vote"
            );
        }
        if self.votes_complete() {
            self.next_round_or_lobby()
        } else {
            Ok(())
        }
    }

    /// True once every active session has voted.
    fn votes_complete(&self) -> bool {
        let active = self.sessions.active_count();
        active > 0 && self.state.votes.len() >= active
    }

    /// AwaitingRestart → Countdown for the next round, or → Lobby once the
    /// round cap is reached.
    pub(crate) fn next_round_or_lobby(&mut self) -> Result<(), SimError> {
        if self.state.round >= self.config.max_rounds {
            info!(rounds = self.state.round, "match over, back to lobby");
            self.go_to_lobby()
        } else {
            self.state.round += 1;
            self.start_countdown()
        }
    }

    /// Any phase → Lobby. Everyone leaves their solo lobby, readiness and
    /// round state are cleared, and round numbering goes back to 0.
    pub(crate) fn go_to_lobby(&mut self) -> Result<(), SimError> {
        self.state.transition(Phase::Lobby);
        self.state.round = 0;
        self.state.countdown_ms = 0.0;
        self.state.round_elapsed_ms = 0.0;
        self.obstacles.clear();

        let (x, y) = (self.config.start_x(), self.config.player_ground_y());
        for player in self.sessions.iter_mut() {
            player.left_to_lobby = false;
            player.ready = false;
            player.reset_for_round(x, y);
        }

        self.broadcast_phase()
    }

    /// Parks `id` in its solo lobby for the rest of the match. Only valid
    /// while a match runs.
    pub(crate) fn leave_to_lobby(&mut self, id: PlayerId) -> Result<(), SimError> {
        if !self.state.phase.is_in_match() {
            return Ok(());
        }
        let Some(player) = self.sessions.get_mut(&id) else {
            return Ok(());
        };
        player.left_to_lobby = true;
        player.ready = false;
        info!(player_id = %id, name = %player.name, "player left to solo lobby");

        self.state.votes.remove(&id);
        self.send_lobby_to(id)?;
        self.reconcile_departure()
    }

    /// Follows up on a session leaving the match, by disconnecting or by
    /// going to its solo lobby.
    pub(crate) fn reconcile_departure(&mut self) -> Result<(), SimError> {
        if self.state.phase.is_in_match() && self.sessions.active_count() == 0 {
            info!("last active player gone, returning to lobby");
            return self.go_to_lobby();
        }
        match self.state.phase {
            // A departure that completes the vote replays the same round.
            Phase::AwaitingRestart if self.votes_complete() => {
                info!(round = self.state.round, "remaining players all voted, restarting round");
                self.start_countdown()
            }
            Phase::AwaitingRestart => Ok(()),
            Phase::Lobby => {
                self.broadcast_lobby()?;
                self.try_start_countdown()
            }
            Phase::Countdown | Phase::Playing => Ok(()),
        }
    }
}
