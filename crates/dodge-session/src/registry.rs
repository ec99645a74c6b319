//! The session registry: every connected participant, keyed by id.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself. It lives inside the
//! world, which sits behind the server's single world lock; nothing here
//! takes a lock of its own.

use std::collections::BTreeMap;

use dodge_protocol::PlayerId;
use rand::Rng;

use crate::{Session, SessionError};

/// Tracks all connected sessions.
///
/// A `BTreeMap` keeps iteration order stable, so every per-player pass of
/// the simulation visits sessions in the same order each tick.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<PlayerId, Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a random id not currently in use.
    pub fn fresh_id<R: Rng>(&self, rng: &mut R) -> PlayerId {
        loop {
            let id = PlayerId(rng.random());
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    /// Registers a new session.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the id is taken.
    pub fn insert(&mut self, session: Session) -> Result<(), SessionError> {
        let id = session.id;
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyConnected(id));
        }
        self.sessions.insert(id, session);
        tracing::info!(player_id = %id, sessions = self.sessions.len(), "session registered");
        Ok(())
    }

    /// Removes a session, returning it.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no such session exists.
    pub fn remove(&mut self, id: PlayerId) -> Result<Session, SessionError> {
        let session = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        tracing::info!(player_id = %id, sessions = self.sessions.len(), "session removed");
        Ok(session)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.sessions.contains_key(id)
    }

    /// All sessions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    /// Sessions taking part in the match (not in the solo lobby).
    pub fn active(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values().filter(|s| s.is_active())
    }

    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut().filter(|s| s.is_active())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions not in the solo lobby.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Number of active sessions still alive.
    pub fn alive_active_count(&self) -> usize {
        self.active().filter(|s| s.alive).count()
    }

    pub fn ready_count(&self) -> usize {
        self.sessions.values().filter(|s| s.ready).count()
    }

    /// `true` when at least one active session exists and every active
    /// session is ready.
    pub fn all_active_ready(&self) -> bool {
        let mut any = false;
        for s in self.active() {
            if !s.ready {
                return false;
            }
            any = true;
        }
        any
    }
}

// =========================================================================
// Tests
// =========================================================================
