//! Wire protocol for live game sessions.
//!
//! Events are closed tagged enums rather than open string-keyed maps, so a
//! malformed frame is rejected at the boundary instead of deep inside a
//! handler. Event and field names are the compatibility surface of the
//! existing front end and must not change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::domain::GameError;

/// Inbound events, one per client-emitted message kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    HostJoin {
        pin: String,
    },
    JoinLobby {
        pin: String,
        name: String,
        #[serde(default)]
        player_id: Option<i64>,
    },
    StartGame {
        pin: String,
    },
    NextQuestion {
        pin: String,
        question_index: usize,
        question_data: Value,
    },
    SubmitAnswer {
        pin: String,
        answer: Value,
        time_taken: f64,
        #[serde(default)]
        player_id: Option<i64>,
        #[serde(default)]
        question_id: Option<i64>,
    },
    ShowResults {
        pin: String,
        #[serde(default)]
        results: Value,
    },
    EndGame {
        pin: String,
        #[serde(default)]
        final_results: Value,
    },
    RequestLeaderboard {
        pin: String,
    },
}

/// Outbound events fanned out by the room hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        sid: Uuid,
    },
    LobbyUpdated {
        players: Vec<PlayerSummary>,
        count: usize,
    },
    PlayerLeft {
        player_name: String,
    },
    GameStarted {
        message: String,
        current_question: usize,
    },
    QuestionUpdate(QuestionPayload),
    AnswerReceived {
        player_id: Option<i64>,
        question_id: Option<i64>,
    },
    PlayerAnswered {
        player_name: String,
        time_taken: f64,
    },
    ResultsUpdate(Value),
    GameEnded {
        message: String,
        results: Value,
    },
    LeaderboardUpdate {
        players: Vec<LeaderboardEntry>,
    },
    HostDisconnected {
        message: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub player_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub player_id: Option<i64>,
}

/// The question as players see it. Built by copying the allowed fields out
/// of the host-supplied payload, so the correct answer can never leak into
/// a room broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub index: usize,
    pub question_id: Option<i64>,
    pub question_text: String,
    pub options: Value,
    pub time_limit: u32,
}

impl QuestionPayload {
    /// Project a host question payload into the player-visible form.
    ///
    /// Accepts `id` or `question_id` for the question identity, matching
    /// what hosts actually send.
    pub fn redact(index: usize, data: &Value) -> Result<Self, GameError> {
        let obj = data
            .as_object()
            .ok_or_else(|| GameError::validation("question data must be an object"))?;

        let question_id = obj
            .get("id")
            .or_else(|| obj.get("question_id"))
            .and_then(Value::as_i64);

        let question_text = obj
            .get("question_text")
            .and_then(Value::as_str)
            .ok_or_else(|| GameError::validation("question data is missing question_text"))?
            .to_string();

        let options = obj
            .get("options")
            .cloned()
            .ok_or_else(|| GameError::validation("question data is missing options"))?;

        let time_limit = obj
            .get("time_limit")
            .and_then(Value::as_u64)
            .and_then(|limit| u32::try_from(limit).ok())
            .ok_or_else(|| GameError::validation("question data is missing time_limit"))?;

        Ok(Self {
            index,
            question_id,
            question_text,
            options,
            time_limit,
        })
    }
}
