//! The authoritative world.
//!
//! [`World`] owns every piece of shared game state: sessions, obstacles,
//! the match state and the spawner. The server keeps exactly one behind a
//! single mutex. Every entry point here (`connect`, `apply`, `disconnect`,
//! `step`) is meant to run with that lock held, and none of them do
//! network I/O: outbound messages are encoded once and pushed into
//! session outboxes.

use std::time::Duration;

use dodge_protocol::{ClientCommand, JsonCodec, Phase, PlayerId, ServerMessage};
use dodge_session::{InputState, Outbox, Rgb, Session, SessionError, SessionRegistry};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::knockback;
use crate::obstacle::Obstacle;
use crate::phase::MatchState;
use crate::physics;
use crate::spawner::Spawner;
use crate::SimError;

pub struct World {
    pub(crate) config: GameConfig,
    pub(crate) codec: JsonCodec,
    pub(crate) seed: u32,
    pub(crate) sessions: SessionRegistry,
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) state: MatchState,
    pub(crate) spawner: Spawner,
    /// Simulation clock, advanced by each fixed step.
    pub(crate) now_ms: f64,
    /// Steps since the last round reset.
    pub(crate) tick: u64,
}

impl World {
    pub fn new(config: GameConfig, seed: u32) -> Self {
        let spawner = Spawner::new(&config, seed);
        Self {
            config,
            codec: JsonCodec,
            seed,
            sessions: SessionRegistry::new(),
            obstacles: Vec::new(),
            state: MatchState::default(),
            spawner,
            now_ms: 0.0,
            tick: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Registers a new connection and greets it.
    ///
    /// The session gets a fresh id and a random pastel colour and is sent
    /// `WELCOME`. Joining an idle lobby broadcasts the updated lobby;
    /// joining a running match parks the session in its solo lobby and
    /// sends the lobby view to it alone.
    pub fn connect(&mut self, outbox: Outbox) -> Result<PlayerId, SimError> {
        let mut rng = rand::rng();
        let id = self.sessions.fresh_id(&mut rng);
        let mut session = Session::new(id, Rgb::pastel(&mut rng), outbox);
        session.x = self.config.start_x();
        session.y = self.config.player_ground_y();

        let mid_match = self.state.phase.is_in_match();
        if mid_match {
            session.left_to_lobby = true;
        }

        // Encode everything before registering, so an error leaves the
        // registry untouched.
        let welcome = self.encode(&ServerMessage::Welcome {
            id,
            seed: self.seed,
            tick_hz: self.config.tick_hz,
            snapshot_hz: self.config.snapshot_hz,
        })?;
        let lobby = self.encode(&ServerMessage::Lobby(self.lobby_state_with(Some(&session))))?;

        session.send(&welcome);
        if mid_match {
            session.send(&lobby);
        }
        self.sessions.insert(session)?;
        if !mid_match {
            for s in self.sessions.active() {
                s.send(&lobby);
            }
        }

        info!(player_id = %id, phase = %self.state.phase, solo = mid_match, "player connected");
        Ok(id)
    }

    /// Removes a session and reconciles the match.
    ///
    /// The session's vote is discarded. If no active session remains the
    /// table returns to the lobby; otherwise a pending restart vote is
    /// re-checked against the smaller table, and in the lobby the others
    /// see the departure and the countdown condition is re-evaluated.
    pub fn disconnect(&mut self, id: PlayerId) -> Result<(), SimError> {
        let session = self.sessions.remove(id)?;
        self.state.votes.remove(&id);
        info!(player_id = %id, name = %session.name, phase = %self.state.phase, "player left");

        self.reconcile_departure()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Applies one decoded command from `id`.
    ///
    /// Commands that make no sense in the current phase are ignored.
    pub fn apply(&mut self, id: PlayerId, cmd: ClientCommand) -> Result<(), SimError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;

        match cmd {
            ClientCommand::Join { name } => {
                if let Some(name) = name {
                    session.set_name(&name);
                }
                info!(player_id = %id, name = %session.name, "player joined");
                self.refresh_lobby_for(id)
            }
            ClientCommand::Input { left, right, up } => {
                session.input = InputState { left, right, up };
                Ok(())
            }
            ClientCommand::Respawn => self.register_vote(id),
            ClientCommand::SetName { name } => {
                if session.set_name(&name) {
                    debug!(player_id = %id, name = %session.name, "name changed");
                }
                self.refresh_lobby_for(id)
            }
            ClientCommand::SetColor { color } => {
                match Rgb::parse(&color) {
                    Some(rgb) => session.color = rgb,
                    None => debug!(player_id = %id, %color, "ignoring invalid colour"),
                }
                self.refresh_lobby_for(id)
            }
            ClientCommand::Ready { ready } => {
                session.ready = ready;
                debug!(player_id = %id, ready, "ready toggled");
                if self.state.phase.is_in_match() {
                    self.send_lobby_to(id)
                } else {
                    self.broadcast_lobby()?;
                    self.try_start_countdown()
                }
            }
            ClientCommand::LeaveToLobby => self.leave_to_lobby(id),
        }
    }

    /// Lobby-visible changes reach everyone in the lobby, but only the
    /// sender while a match runs.
    fn refresh_lobby_for(&self, id: PlayerId) -> Result<(), SimError> {
        if self.state.phase.is_in_match() {
            self.send_lobby_to(id)
        } else {
            self.broadcast_lobby()
        }
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Advances the world by one fixed step of `dt`.
    ///
    /// Order within a step: empty-table check, countdown, then for a
    /// running round: spawning, per-player physics and collisions,
    /// obstacle advancement with exit bonuses and blasts, end-of-round
    /// detection.
    pub fn step(&mut self, dt: Duration) -> Result<(), SimError> {
        let dt_s = dt.as_secs_f32();
        let dt_ms = dt.as_secs_f64() * 1000.0;
        self.now_ms += dt_ms;
        self.tick += 1;

        if self.sessions.active_count() == 0 {
            if self.state.phase.is_in_match() {
                info!("no active players, returning to lobby");
                self.go_to_lobby()?;
            }
            return Ok(());
        }

        match self.state.phase {
            Phase::Lobby | Phase::AwaitingRestart => Ok(()),
            Phase::Countdown => {
                self.state.countdown_ms -= dt_ms;
                if self.state.countdown_ms <= 0.0 {
                    self.begin_playing()?;
                }
                Ok(())
            }
            Phase::Playing => self.step_playing(dt_s, dt_ms),
        }
    }

    fn step_playing(&mut self, dt: f32, dt_ms: f64) -> Result<(), SimError> {
        self.state.round_elapsed_ms += dt_ms;

        let spawned = self.spawner.tick(self.state.round_elapsed_ms, dt_ms);
        self.obstacles.extend(spawned);

        let now_ms = self.now_ms;
        for player in self.sessions.active_mut().filter(|p| p.alive) {
            physics::step_player(player, &self.config, dt, now_ms);
            let hitbox = physics::player_hitbox(player, &self.config);
            if physics::touches_lethal(&hitbox, &self.obstacles) {
                player.alive = false;
                info!(player_id = %player.id, score = player.score, "player died");
            }
        }

        let outcome = physics::advance_obstacles(&mut self.obstacles, &self.config, dt, dt_ms);

        if outcome.exited > 0 {
            let bonus = self.config.exit_bonus * outcome.exited;
            for player in self.sessions.active_mut().filter(|p| p.alive) {
                player.score = player.score.saturating_add(bonus);
            }
        }

        let ground = self.config.ground_y();
        for cx in outcome.landed_bombs {
            let hit = knockback::apply_blast(self.sessions.active_mut(), cx, ground, &self.config, now_ms);
            debug!(x = cx, hit, "bomb exploded");
            self.obstacles.push(knockback::explosion(cx, ground, &self.config));
        }

        if self.sessions.alive_active_count() == 0 {
            self.end_round()?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn countdown_ms(&self) -> f64 {
        self.state.countdown_ms
    }

    pub fn round_elapsed_ms(&self) -> f64 {
        self.state.round_elapsed_ms
    }

    pub fn vote_count(&self) -> usize {
        self.state.votes.len()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn session(&self, id: &PlayerId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Direct access to a session, for tooling and tests that need to
    /// place a player.
    pub fn session_mut(&mut self, id: &PlayerId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Adds an obstacle outside the spawner's schedule.
    pub fn insert_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }
}
