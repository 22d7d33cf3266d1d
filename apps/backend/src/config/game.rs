//! Game tuning configuration.
//!
//! Everything the orchestrator needs beyond its own state is injected
//! through this struct at construction time; there is no global settings
//! object. Environment overrides:
//!
//! - `GAME_POINTS_CORRECT` (default 1000)
//! - `GAME_SPEED_BONUS_MAX` (default 500)
//! - `GAME_DISCONNECT_GRACE_SECS` (default 8)

use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_POINTS_CORRECT: u32 = 1000;
pub const DEFAULT_SPEED_BONUS_MAX: u32 = 500;
pub const DEFAULT_DISCONNECT_GRACE_SECS: u64 = 8;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Points awarded for any correct answer.
    pub base_points: u32,
    /// Maximum additional points for an instant answer.
    pub speed_bonus_max: u32,
    /// How long a dropped player keeps their seat before removal.
    pub disconnect_grace: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_points: DEFAULT_POINTS_CORRECT,
            speed_bonus_max: DEFAULT_SPEED_BONUS_MAX,
            disconnect_grace: Duration::from_secs(DEFAULT_DISCONNECT_GRACE_SECS),
        }
    }
}

impl GameConfig {
    /// Build a config from the environment, falling back to defaults for
    /// unset variables. Set-but-unparseable values are a configuration
    /// error rather than a silent fallback.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            base_points: parse_var("GAME_POINTS_CORRECT", defaults.base_points)?,
            speed_bonus_max: parse_var("GAME_SPEED_BONUS_MAX", defaults.speed_bonus_max)?,
            disconnect_grace: Duration::from_secs(parse_var(
                "GAME_DISCONNECT_GRACE_SECS",
                DEFAULT_DISCONNECT_GRACE_SECS,
            )?),
        })
    }

    /// Config with a near-instant grace window, for tests that drive
    /// disconnect expiry without waiting out the production window.
    pub fn with_grace(disconnect_grace: Duration) -> Self {
        Self {
            disconnect_grace,
            ..Self::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{name} must be a non-negative integer"))),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(AppError::config(format!("{name}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scoring_contract() {
        let config = GameConfig::default();
        assert_eq!(config.base_points, 1000);
        assert_eq!(config.speed_bonus_max, 500);
        assert_eq!(config.disconnect_grace, Duration::from_secs(8));
    }

    #[test]
    fn with_grace_overrides_only_the_window() {
        let config = GameConfig::with_grace(Duration::from_millis(20));
        assert_eq!(config.base_points, 1000);
        assert_eq!(config.disconnect_grace, Duration::from_millis(20));
    }
}
