//! Building and delivering `LOBBY` and `SNAPSHOT` payloads.
//!
//! Payloads are encoded once per broadcast and shared between recipients
//! as [`Outbound`] buffers. Sessions in their solo lobby never receive
//! snapshots and are left out of them.

use std::sync::Arc;

use dodge_protocol::{
    Codec, LobbyPlayer, LobbyState, Phase, PlayerId, ServerMessage, Snapshot, SnapshotPlayer,
};
use dodge_session::{Outbound, Outbox, Session};

use crate::{SimError, World};

/// An encoded payload and the outboxes it should reach, captured under
/// the world lock and delivered after it is released.
#[derive(Debug)]
pub struct BroadcastFrame {
    pub payload: Outbound,
    pub recipients: Vec<Outbox>,
}

impl BroadcastFrame {
    /// Queues the payload for every recipient whose connection is still
    /// up. Returns the number of successful deliveries.
    pub fn deliver(&self) -> usize {
        self.recipients
            .iter()
            .filter(|tx| tx.send(Arc::clone(&self.payload)).is_ok())
            .count()
    }
}

impl World {
    pub(crate) fn encode(&self, msg: &ServerMessage) -> Result<Outbound, SimError> {
        Ok(Arc::new(self.codec.encode(msg)?))
    }

    /// The lobby roster: every connected session.
    pub fn lobby_state(&self) -> LobbyState {
        self.lobby_state_with(None)
    }

    /// The lobby roster as it will look once `joining` is registered.
    pub(crate) fn lobby_state_with(&self, joining: Option<&Session>) -> LobbyState {
        let mut players: Vec<LobbyPlayer> = self
            .sessions
            .iter()
            .chain(joining)
            .map(|s| LobbyPlayer {
                id: s.id,
                name: s.name.clone(),
                color: s.color.to_string(),
                ready: s.ready,
            })
            .collect();
        players.sort_by_key(|p| p.id);
        let ready_count = players.iter().filter(|p| p.ready).count();
        LobbyState {
            phase: Phase::Lobby,
            need_count: players.len(),
            ready_count,
            players,
        }
    }

    /// The world as active sessions see it. Vote and match-total fields are
    /// only filled while waiting for a restart.
    pub fn snapshot(&self) -> Snapshot {
        let players = self
            .sessions
            .active()
            .map(|s| SnapshotPlayer {
                id: s.id,
                name: s.name.clone(),
                x: s.x,
                y: s.y,
                alive: s.alive,
                score: s.score,
            })
            .collect();
        let obstacles = self.obstacles.iter().map(|o| o.to_wire()).collect();

        let awaiting = self.state.phase == Phase::AwaitingRestart;
        Snapshot {
            tick: self.tick,
            round: self.state.round,
            phase: self.state.phase,
            countdown_ms: self.state.countdown_ms.max(0.0).ceil() as u32,
            need_count: self.sessions.active_count(),
            vote_count: awaiting.then(|| self.state.votes.len()),
            players,
            obstacles,
            match_round: awaiting.then_some(self.state.round),
            match_total: awaiting.then_some(self.config.max_rounds),
            totals: awaiting.then(|| self.state.totals.values().cloned().collect()),
        }
    }

    /// Sends the lobby roster to every active session.
    pub(crate) fn broadcast_lobby(&self) -> Result<(), SimError> {
        let payload = self.encode(&ServerMessage::Lobby(self.lobby_state()))?;
        for s in self.sessions.active() {
            s.send(&payload);
        }
        Ok(())
    }

    /// Sends the lobby roster to one session only.
    pub(crate) fn send_lobby_to(&self, id: PlayerId) -> Result<(), SimError> {
        let Some(session) = self.sessions.get(&id) else {
            return Ok(());
        };
        let payload = self.encode(&ServerMessage::Lobby(self.lobby_state()))?;
        session.send(&payload);
        Ok(())
    }

    pub(crate) fn broadcast_snapshot(&self) -> Result<(), SimError> {
        let payload = self.encode(&ServerMessage::Snapshot(self.snapshot()))?;
        for s in self.sessions.active() {
            s.send(&payload);
        }
        Ok(())
    }

    /// Announces the current phase right away.
    pub(crate) fn broadcast_phase(&self) -> Result<(), SimError> {
        if self.state.phase == Phase::Lobby {
            self.broadcast_lobby()
        } else {
            self.broadcast_snapshot()
        }
    }

    /// The periodic snapshot, or `None` in the lobby where rosters are
    /// pushed on events instead.
    pub fn snapshot_frame(&self) -> Result<Option<BroadcastFrame>, SimError> {
        if self.state.phase == Phase::Lobby {
            return Ok(None);
        }
        let payload = self.encode(&ServerMessage::Snapshot(self.snapshot()))?;
        let recipients = self.sessions.active().map(|s| s.outbox()).collect();
        Ok(Some(BroadcastFrame { payload, recipients }))
    }
}

#[cfg(test)]
mod tests {
    use dodge_protocol::ClientCommand;
    use tokio::sync::mpsc;

    use super::*;
    use crate::GameConfig;

    #[test]
    fn test_lobby_state_counts_ready() {
        let mut world = World::new(GameConfig::default(), 1);
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = world.connect(tx).unwrap();
        let (tx, _rx2) = mpsc::unbounded_channel();
        world.connect(tx).unwrap();
        world.apply(a, ClientCommand::SetColor { color: "#102030".into() }).unwrap();
        world.apply(a, ClientCommand::Ready { ready: true }).unwrap();

        let lobby = world.lobby_state();
        assert_eq!(lobby.need_count, 2);
        assert_eq!(lobby.ready_count, 1);
        let row = lobby.players.iter().find(|p| p.id == a).unwrap();
        assert_eq!(row.color, "#102030");
    }

    #[test]
    fn test_joining_roster_is_built_before_registration() {
        let mut world = World::new(GameConfig::default(), 1);
        let (tx, _rx) = mpsc::unbounded_channel();
        world.connect(tx).unwrap();

        let (tx, _rx2) = mpsc::unbounded_channel();
        let pending = Session::new(PlayerId(0), dodge_session::Rgb::DEFAULT, tx);
        let lobby = world.lobby_state_with(Some(&pending));

        assert_eq!(world.sessions().len(), 1);
        assert_eq!(lobby.need_count, 2);
        assert_eq!(lobby.ready_count, 0);
        assert_eq!(lobby.players[0].id, PlayerId(0));
    }

    #[test]
    fn test_joiner_sees_itself_in_first_lobby() {
        let mut world = World::new(GameConfig::default(), 1);
        let (tx, mut first_rx) = mpsc::unbounded_channel();
        world.connect(tx).unwrap();
        while first_rx.try_recv().is_ok() {}

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = world.connect(tx).unwrap();

        let msgs: Vec<ServerMessage> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|b| serde_json::from_slice(&b).unwrap())
            .collect();
        assert!(matches!(msgs[0], ServerMessage::Welcome { .. }));
        let ServerMessage::Lobby(lobby) = &msgs[1] else {
            panic!("expected LOBBY, got {:?}", msgs[1]);
        };
        assert_eq!(lobby.need_count, 2);
        assert!(lobby.players.iter().any(|p| p.id == id));

        // The earlier session got the same roster.
        let bytes = first_rx.try_recv().unwrap();
        let msg: ServerMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, msgs[1]);
    }

    #[test]
    fn test_no_periodic_frame_in_lobby() {
        let world = World::new(GameConfig::default(), 1);
        assert!(world.snapshot_frame().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_omits_solo_lobby_sessions() {
        let mut world = World::new(GameConfig::default(), 1);
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = world.connect(tx).unwrap();
        world.apply(a, ClientCommand::Ready { ready: true }).unwrap();

        // A latecomer lands in the solo lobby.
        let (tx, mut late_rx) = mpsc::unbounded_channel();
        let late = world.connect(tx).unwrap();
        while late_rx.try_recv().is_ok() {}

        let frame = world.snapshot_frame().unwrap().unwrap();
        assert_eq!(frame.recipients.len(), 1);
        assert_eq!(frame.deliver(), 1);
        assert!(late_rx.try_recv().is_err());

        let snap = world.snapshot();
        assert_eq!(snap.need_count, 1);
        assert!(snap.players.iter().all(|p| p.id != late));
        assert_eq!(snap.vote_count, None);
        assert_eq!(snap.countdown_ms, 3000);
    }
}
