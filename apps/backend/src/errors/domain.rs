//! Domain-level error type for the live game orchestrator.
//!
//! This error type is HTTP- and transport-agnostic. Event handlers return
//! `Result<T, GameError>`; the WebSocket layer relays rejections to the
//! offending connection as a wire `error` event, and the HTTP edge converts
//! them via `From<GameError> for AppError`.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Central domain error type for live session handling.
///
/// Every rejection is local: a bad event from one connection never corrupts
/// or stalls the room for others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Missing or malformed PIN, name, or timing fields.
    Validation(String),
    /// A host-only event invoked by a connection that is not the recorded host.
    Unauthorized(String),
    /// Event requires pre-existing session state for an unknown PIN.
    NotFound(String),
    /// Contract violation (e.g. non-positive time limit handed to scoring).
    Invariant(String),
}

impl Display for GameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            GameError::Validation(d) => write!(f, "validation error: {d}"),
            GameError::Unauthorized(d) => write!(f, "unauthorized: {d}"),
            GameError::NotFound(d) => write!(f, "not found: {d}"),
            GameError::Invariant(d) => write!(f, "invariant violation: {d}"),
        }
    }
}

impl Error for GameError {}

impl GameError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized(detail.into())
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }

    /// The human-readable detail without the kind prefix.
    ///
    /// This is what goes over the wire in `error {message}` payloads.
    pub fn message(&self) -> &str {
        match self {
            GameError::Validation(d)
            | GameError::Unauthorized(d)
            | GameError::NotFound(d)
            | GameError::Invariant(d) => d,
        }
    }
}
