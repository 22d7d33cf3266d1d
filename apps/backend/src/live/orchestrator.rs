//! Session orchestrator: validates role and state for every inbound event,
//! mutates the session registry, and drives the room hub.
//!
//! All mutation of one PIN happens under that session's lock, so events for
//! the same room are linearized in arrival order while distinct rooms
//! proceed in parallel. Broadcasts are issued while the lock is held and
//! therefore observe the same order.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::errors::domain::GameError;
use crate::live::hub::RoomHub;
use crate::live::protocol::{ClientEvent, QuestionPayload, ServerEvent};
use crate::live::registry::{ConnId, SessionRegistry, SessionStatus};
use crate::live::GraceTracker;

const GAME_STARTING_MESSAGE: &str = "Game is starting!";
const GAME_ENDED_MESSAGE: &str = "Game has ended!";
const HOST_DISCONNECTED_MESSAGE: &str = "Host disconnected";

pub struct SessionOrchestrator {
    registry: SessionRegistry,
    hub: Arc<RoomHub>,
    grace: GraceTracker,
    config: GameConfig,
}

impl SessionOrchestrator {
    pub fn new(config: GameConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: SessionRegistry::new(),
            hub: Arc::new(RoomHub::new()),
            grace: GraceTracker::new(),
            config,
        })
    }

    pub fn hub(&self) -> Arc<RoomHub> {
        Arc::clone(&self.hub)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Route one inbound event. Rejections are relayed to the offending
    /// connection as a wire `error` event and go nowhere else.
    pub fn dispatch(self: &Arc<Self>, conn_id: ConnId, event: ClientEvent) {
        let result = match event {
            ClientEvent::HostJoin { pin } => self.host_join(conn_id, &pin),
            ClientEvent::JoinLobby {
                pin,
                name,
                player_id,
            } => self.join_lobby(conn_id, &pin, name, player_id),
            ClientEvent::StartGame { pin } => self.start_game(conn_id, &pin),
            ClientEvent::NextQuestion {
                pin,
                question_index,
                question_data,
            } => self.next_question(conn_id, &pin, question_index, &question_data),
            ClientEvent::SubmitAnswer {
                pin,
                answer: _,
                time_taken,
                player_id,
                question_id,
            } => self.submit_answer(conn_id, &pin, time_taken, player_id, question_id),
            ClientEvent::ShowResults { pin, results } => {
                self.show_results(conn_id, &pin, results)
            }
            ClientEvent::EndGame { pin, final_results } => {
                self.end_game(conn_id, &pin, final_results)
            }
            ClientEvent::RequestLeaderboard { pin } => self.request_leaderboard(conn_id, &pin),
        };

        if let Err(err) = result {
            warn!(conn_id = %conn_id, error = %err, "live event rejected");
            self.hub.send_to(
                conn_id,
                ServerEvent::Error {
                    message: err.message().to_string(),
                },
            );
        }
    }

    /// Attach a connection as host of a (new or existing) session. The
    /// latest claimant wins; seated players are untouched.
    pub fn host_join(&self, conn_id: ConnId, pin: &str) -> Result<(), GameError> {
        validate_pin(pin)?;

        self.hub.join_room(pin, conn_id);
        let session = self.registry.get_or_create(pin);
        session.lock().attach_host(conn_id);

        info!(pin, conn_id = %conn_id, "host joined game");
        Ok(())
    }

    /// Seat a player in the lobby, evicting stale connections with the
    /// same identity and cancelling any pending disconnect for the joiner.
    /// A (re)join while the game is Active gets an immediate private
    /// resynchronization instead of re-alerting the whole room.
    pub fn join_lobby(
        &self,
        conn_id: ConnId,
        pin: &str,
        name: String,
        player_id: Option<i64>,
    ) -> Result<(), GameError> {
        validate_pin(pin)?;
        if name.trim().is_empty() {
            return Err(GameError::validation("Invalid data"));
        }

        // A connection sits in at most one session, matching its single
        // hub room. Taken before the target session lock so no two
        // session locks are ever held together.
        self.leave_other_sessions(conn_id, pin);

        let session = self.registry.get_or_create(pin);
        let mut session = session.lock();

        let evicted = session.seat_player(conn_id, name.clone(), player_id)?;

        self.grace.cancel(conn_id);
        for stale in evicted {
            self.grace.cancel(stale);
        }

        self.hub.join_room(pin, conn_id);
        self.hub.broadcast(
            pin,
            &ServerEvent::LobbyUpdated {
                players: session.player_summaries(),
                count: session.player_count(),
            },
        );

        if session.status() == SessionStatus::Active {
            self.hub.send_to(
                conn_id,
                ServerEvent::GameStarted {
                    message: GAME_STARTING_MESSAGE.to_string(),
                    current_question: session.current_question(),
                },
            );
            if let Some(question) = session.current_question_data() {
                self.hub
                    .send_to(conn_id, ServerEvent::QuestionUpdate(question.clone()));
            }
        }

        info!(pin, player = %name, conn_id = %conn_id, "player joined lobby");
        Ok(())
    }

    pub fn start_game(&self, conn_id: ConnId, pin: &str) -> Result<(), GameError> {
        validate_pin(pin)?;
        let session = self
            .registry
            .get(pin)
            .ok_or_else(|| GameError::not_found("Game not found"))?;
        let mut session = session.lock();

        if !session.is_host(conn_id) {
            return Err(GameError::unauthorized("Only host can start the game"));
        }
        session.start()?;

        self.hub.broadcast(
            pin,
            &ServerEvent::GameStarted {
                message: GAME_STARTING_MESSAGE.to_string(),
                current_question: 0,
            },
        );

        info!(pin, "game started");
        Ok(())
    }

    /// Advance to a question and push the redacted payload to the room.
    pub fn next_question(
        &self,
        conn_id: ConnId,
        pin: &str,
        question_index: usize,
        question_data: &Value,
    ) -> Result<(), GameError> {
        validate_pin(pin)?;
        let session = self
            .registry
            .get(pin)
            .ok_or_else(|| GameError::not_found("Game not found"))?;
        let mut session = session.lock();

        if !session.is_host(conn_id) {
            return Err(GameError::unauthorized("Only host can control questions"));
        }

        let payload = QuestionPayload::redact(question_index, question_data)?;
        session.set_question(payload.clone())?;

        self.hub.broadcast(pin, &ServerEvent::QuestionUpdate(payload));

        info!(pin, question_index, "moved to question");
        Ok(())
    }

    /// Ack an answer to the submitter and tip off the host that this
    /// player has answered. No session state changes here; correctness
    /// checking and score persistence belong to the answer-recording
    /// caller, and answer content is never relayed.
    pub fn submit_answer(
        &self,
        conn_id: ConnId,
        pin: &str,
        time_taken: f64,
        player_id: Option<i64>,
        question_id: Option<i64>,
    ) -> Result<(), GameError> {
        validate_pin(pin)?;
        if !time_taken.is_finite() || time_taken < 0.0 {
            return Err(GameError::validation("Invalid answer data"));
        }

        let session = self
            .registry
            .get(pin)
            .ok_or_else(|| GameError::not_found("Game not found"))?;
        let session = session.lock();

        if !session.contains_player(conn_id) {
            return Err(GameError::validation("Not a player in this game"));
        }

        self.hub.send_to(
            conn_id,
            ServerEvent::AnswerReceived {
                player_id,
                question_id,
            },
        );

        if let (Some(host), Some(name)) = (session.host_conn(), session.player_name(conn_id)) {
            self.hub.send_to(
                host,
                ServerEvent::PlayerAnswered {
                    player_name: name.to_string(),
                    time_taken,
                },
            );
        }

        Ok(())
    }

    /// Forward the host's results payload to the room as-is. Unlike
    /// question broadcasts, results may carry correct answers.
    pub fn show_results(
        &self,
        conn_id: ConnId,
        pin: &str,
        results: Value,
    ) -> Result<(), GameError> {
        validate_pin(pin)?;
        let session = self
            .registry
            .get(pin)
            .ok_or_else(|| GameError::not_found("Game not found"))?;
        let session = session.lock();

        if !session.is_host(conn_id) {
            return Err(GameError::unauthorized("Only host can show results"));
        }

        self.hub.broadcast(pin, &ServerEvent::ResultsUpdate(results));
        Ok(())
    }

    pub fn end_game(
        &self,
        conn_id: ConnId,
        pin: &str,
        final_results: Value,
    ) -> Result<(), GameError> {
        validate_pin(pin)?;
        let session = self
            .registry
            .get(pin)
            .ok_or_else(|| GameError::not_found("Game not found"))?;
        let mut session = session.lock();

        if !session.is_host(conn_id) {
            return Err(GameError::unauthorized("Only host can end the game"));
        }
        session.finish()?;

        self.hub.broadcast(
            pin,
            &ServerEvent::GameEnded {
                message: GAME_ENDED_MESSAGE.to_string(),
                results: final_results,
            },
        );

        info!(pin, "game ended");
        Ok(())
    }

    /// Send the current leaderboard to the requester.
    pub fn request_leaderboard(&self, conn_id: ConnId, pin: &str) -> Result<(), GameError> {
        validate_pin(pin)?;
        let session = self
            .registry
            .get(pin)
            .ok_or_else(|| GameError::not_found("Game not found"))?;
        let players = session.lock().leaderboard();

        self.hub
            .send_to(conn_id, ServerEvent::LeaderboardUpdate { players });
        Ok(())
    }

    /// Unseat a connection from every session other than `pin`, telling
    /// each abandoned room. Without this, moving between games would leave
    /// a ghost member behind in the old session's lobby and leaderboard.
    fn leave_other_sessions(&self, conn_id: ConnId, pin: &str) {
        for session in self.registry.all() {
            let mut session = session.lock();
            if session.pin() == pin {
                continue;
            }
            let Some(participant) = session.remove_player(conn_id) else {
                continue;
            };

            self.hub.broadcast(
                session.pin(),
                &ServerEvent::PlayerLeft {
                    player_name: participant.name.clone(),
                },
            );
            self.hub.broadcast(
                session.pin(),
                &ServerEvent::LobbyUpdated {
                    players: session.player_summaries(),
                    count: session.player_count(),
                },
            );

            info!(pin = %session.pin(), player = %participant.name, "player moved to another game");
        }
    }

    /// Transport-level connection drop. A host slot is cleared immediately
    /// and the room is told; a player keeps their seat for the grace
    /// window and is only removed if they do not come back.
    pub fn handle_disconnect(self: &Arc<Self>, conn_id: ConnId) {
        for session in self.registry.all() {
            let mut session = session.lock();
            let pin = session.pin().to_string();

            if session.is_host(conn_id) {
                session.clear_host();
                self.hub.broadcast(
                    &pin,
                    &ServerEvent::HostDisconnected {
                        message: HOST_DISCONNECTED_MESSAGE.to_string(),
                    },
                );
                info!(pin = %pin, conn_id = %conn_id, "host disconnected");
            }

            if session.contains_player(conn_id) {
                let orchestrator = Arc::downgrade(self);
                let grace_pin = pin.clone();
                self.grace.arm(
                    conn_id,
                    pin,
                    self.config.disconnect_grace,
                    move || {
                        if let Some(orchestrator) = orchestrator.upgrade() {
                            orchestrator.remove_after_grace(&grace_pin, conn_id);
                        }
                    },
                );
            }
        }
    }

    /// Grace-window expiry for one connection. The timer has already
    /// claimed its pending entry; the broadcast happens only if the player
    /// was in fact still seated.
    fn remove_after_grace(&self, pin: &str, conn_id: ConnId) {
        let Some(session) = self.registry.get(pin) else {
            return;
        };
        let mut session = session.lock();
        let Some(participant) = session.remove_player(conn_id) else {
            return;
        };

        self.hub.broadcast(
            pin,
            &ServerEvent::PlayerLeft {
                player_name: participant.name.clone(),
            },
        );
        self.hub.broadcast(
            pin,
            &ServerEvent::LobbyUpdated {
                players: session.player_summaries(),
                count: session.player_count(),
            },
        );

        info!(pin, player = %participant.name, "player removed after grace window");
    }

}

// A game PIN is exactly six ASCII digits.
fn validate_pin(pin: &str) -> Result<(), GameError> {
    if pin.len() != 6 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(GameError::validation("Invalid PIN"));
    }
    Ok(())
}
