//! Session registry: the process-wide PIN -> session table and the session
//! state machine.
//!
//! The table is a `DashMap` so distinct games never contend; each session
//! carries its own lock so all mutation of one room is serialized. This is
//! single-process coordination state only: it is never persisted, and a
//! second backend process would not share it.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::errors::domain::GameError;
use crate::live::protocol::{LeaderboardEntry, PlayerSummary, QuestionPayload};

/// One logical connection (one browser tab).
pub type ConnId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Waiting,
    Active,
    Finished,
}

/// Ephemeral projection of a durable player into the live room. The score
/// is a display cache for the leaderboard; the authoritative score lives in
/// the durable store and is written by the answer-recording caller.
#[derive(Debug, Clone)]
pub struct Participant {
    pub name: String,
    pub player_id: Option<i64>,
    pub score: u32,
}

/// Live state for one game PIN.
///
/// Status only ever moves Waiting -> Active -> Finished, and a Finished
/// session accepts no further mutation.
#[derive(Debug)]
pub struct GameSession {
    pin: String,
    host_conn: Option<ConnId>,
    status: SessionStatus,
    current_question: usize,
    current_question_data: Option<QuestionPayload>,
    // Insertion order is retained: the leaderboard's stable sort keeps
    // earlier joiners ahead on equal scores.
    players: Vec<(ConnId, Participant)>,
}

impl GameSession {
    fn new(pin: String) -> Self {
        Self {
            pin,
            host_conn: None,
            status: SessionStatus::Waiting,
            current_question: 0,
            current_question_data: None,
            players: Vec::new(),
        }
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_question(&self) -> usize {
        self.current_question
    }

    pub fn current_question_data(&self) -> Option<&QuestionPayload> {
        self.current_question_data.as_ref()
    }

    pub fn host_conn(&self) -> Option<ConnId> {
        self.host_conn
    }

    pub fn is_host(&self, conn_id: ConnId) -> bool {
        self.host_conn == Some(conn_id)
    }

    /// Record `conn_id` as the session host. The latest claimant wins; a
    /// host reconnecting mid-lobby does not reset seated players. A host
    /// connection is never simultaneously a player, so any player entry for
    /// the same connection is dropped.
    pub fn attach_host(&mut self, conn_id: ConnId) {
        self.players.retain(|(existing, _)| *existing != conn_id);
        self.host_conn = Some(conn_id);
    }

    pub fn clear_host(&mut self) {
        self.host_conn = None;
    }

    /// Seat a player, replacing any stale entry for the same connection and
    /// evicting other connections that carry the same player identity
    /// (same `player_id`, or same name when ids are absent).
    ///
    /// A connection is never host and member at once: the latest role claim
    /// wins, mirroring [`GameSession::attach_host`], so seating the current
    /// host connection vacates the host slot.
    ///
    /// Returns the evicted stale connection ids so the caller can cancel
    /// their pending disconnect timers.
    pub fn seat_player(
        &mut self,
        conn_id: ConnId,
        name: String,
        player_id: Option<i64>,
    ) -> Result<Vec<ConnId>, GameError> {
        if self.status == SessionStatus::Finished {
            return Err(GameError::validation("Game has already finished"));
        }

        if self.host_conn == Some(conn_id) {
            self.host_conn = None;
        }

        let stale: Vec<ConnId> = self
            .players
            .iter()
            .filter(|(existing, participant)| {
                *existing != conn_id
                    && ((player_id.is_some() && participant.player_id == player_id)
                        || participant.name == name)
            })
            .map(|(existing, _)| *existing)
            .collect();

        self.players
            .retain(|(existing, _)| *existing != conn_id && !stale.contains(existing));

        self.players.push((
            conn_id,
            Participant {
                name,
                player_id,
                score: 0,
            },
        ));

        Ok(stale)
    }

    /// Remove a player if still seated. Finished sessions are read-only.
    pub fn remove_player(&mut self, conn_id: ConnId) -> Option<Participant> {
        if self.status == SessionStatus::Finished {
            return None;
        }
        let idx = self
            .players
            .iter()
            .position(|(existing, _)| *existing == conn_id)?;
        Some(self.players.remove(idx).1)
    }

    pub fn contains_player(&self, conn_id: ConnId) -> bool {
        self.players.iter().any(|(existing, _)| *existing == conn_id)
    }

    pub fn player_name(&self, conn_id: ConnId) -> Option<&str> {
        self.players
            .iter()
            .find(|(existing, _)| *existing == conn_id)
            .map(|(_, participant)| participant.name.as_str())
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_summaries(&self) -> Vec<PlayerSummary> {
        self.players
            .iter()
            .map(|(_, participant)| PlayerSummary {
                name: participant.name.clone(),
                player_id: participant.player_id,
            })
            .collect()
    }

    /// Leaderboard projection, descending by score. The sort is stable, so
    /// equal scores keep their prior relative order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .iter()
            .map(|(_, participant)| LeaderboardEntry {
                name: participant.name.clone(),
                score: participant.score,
                player_id: participant.player_id,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Update the cached display score for a seated player.
    pub fn set_player_score(&mut self, conn_id: ConnId, score: u32) {
        if self.status == SessionStatus::Finished {
            return;
        }
        if let Some((_, participant)) = self
            .players
            .iter_mut()
            .find(|(existing, _)| *existing == conn_id)
        {
            participant.score = score;
        }
    }

    /// Waiting -> Active. Resets the question cursor and the cached
    /// question payload.
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.status {
            SessionStatus::Waiting => {
                self.status = SessionStatus::Active;
                self.current_question = 0;
                self.current_question_data = None;
                Ok(())
            }
            SessionStatus::Active => Err(GameError::validation("Game has already started")),
            SessionStatus::Finished => Err(GameError::validation("Game has already finished")),
        }
    }

    /// Advance the question cursor and cache the redacted payload for
    /// mid-question rejoin resynchronization. The cursor never moves
    /// backwards.
    pub fn set_question(&mut self, payload: QuestionPayload) -> Result<(), GameError> {
        if self.status == SessionStatus::Finished {
            return Err(GameError::validation("Game has already finished"));
        }
        if payload.index < self.current_question {
            return Err(GameError::validation(
                "question index cannot move backwards",
            ));
        }
        self.current_question = payload.index;
        self.current_question_data = Some(payload);
        Ok(())
    }

    /// Active -> Finished. The session becomes read-only.
    pub fn finish(&mut self) -> Result<(), GameError> {
        match self.status {
            SessionStatus::Active => {
                self.status = SessionStatus::Finished;
                Ok(())
            }
            SessionStatus::Waiting => Err(GameError::validation("Game has not started")),
            SessionStatus::Finished => Err(GameError::validation("Game has already finished")),
        }
    }
}

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Process-wide mapping from game PIN to live session state.
///
/// Finished sessions are not evicted automatically; the surrounding process
/// decides when to call [`SessionRegistry::remove`]. Left as-is this table
/// grows with every completed game.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SharedSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Fetch the session for `pin`, allocating a Waiting session with no
    /// host and no members on first sight of the PIN.
    pub fn get_or_create(&self, pin: &str) -> SharedSession {
        self.sessions
            .entry(pin.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(GameSession::new(pin.to_string()))))
            .clone()
    }

    pub fn get(&self, pin: &str) -> Option<SharedSession> {
        self.sessions.get(pin).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, pin: &str) -> Option<SharedSession> {
        self.sessions.remove(pin).map(|(_, session)| session)
    }

    /// Snapshot of every live session. Used by disconnect handling, which
    /// has only a connection id to go on.
    pub fn all(&self) -> Vec<SharedSession> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
