//! Pure scoring engine: correctness + timing -> points.
//!
//! The orchestrator itself never calls this during a game; the caller that
//! records an answer supplies correctness and timing, computes the points
//! here, and writes them to durable storage. Keeping it pure lets the
//! contract be tested exhaustively.

use crate::config::GameConfig;
use crate::errors::domain::GameError;

/// Calculate the points for one answer.
///
/// Wrong answers are worth 0 regardless of timing. Correct answers earn
/// `base_points` plus a speed bonus scaled by how much of the time limit
/// was left; the ratio is clamped to [0, 1], so answers at or past the
/// limit earn the base score only and an instant answer earns the full
/// bonus.
///
/// A non-positive `time_limit` is a contract violation, not an input to
/// coerce: it is rejected so the ratio can never divide by zero.
pub fn calculate_score(
    is_correct: bool,
    time_taken: f64,
    time_limit: u32,
    config: &GameConfig,
) -> Result<u32, GameError> {
    if time_limit == 0 {
        return Err(GameError::invariant("time limit must be positive"));
    }
    if !time_taken.is_finite() || time_taken < 0.0 {
        return Err(GameError::validation("time taken must be a number >= 0"));
    }

    if !is_correct {
        return Ok(0);
    }

    let limit = f64::from(time_limit);
    let time_ratio = ((limit - time_taken) / limit).clamp(0.0, 1.0);
    let speed_bonus = (f64::from(config.speed_bonus_max) * time_ratio) as u32;

    Ok(config.base_points + speed_bonus)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn wrong_answer_scores_zero_regardless_of_timing() {
        for time_taken in [0.0, 5.0, 30.0, 300.0] {
            assert_eq!(calculate_score(false, time_taken, 30, &config()), Ok(0));
        }
    }

    #[test]
    fn instant_answer_earns_full_bonus() {
        assert_eq!(calculate_score(true, 0.0, 30, &config()), Ok(1500));
        assert_eq!(calculate_score(true, 0.0, 1, &config()), Ok(1500));
    }

    #[test]
    fn answer_at_the_limit_earns_base_points_only() {
        assert_eq!(calculate_score(true, 30.0, 30, &config()), Ok(1000));
    }

    #[test]
    fn answer_past_the_limit_does_not_go_below_base() {
        assert_eq!(calculate_score(true, 45.0, 30, &config()), Ok(1000));
    }

    #[test]
    fn bonus_is_floored_not_rounded() {
        // 5s of a 30s limit: 500 * 25/30 = 416.66.. -> 416
        assert_eq!(calculate_score(true, 5.0, 30, &config()), Ok(1416));
    }

    #[test]
    fn zero_time_limit_is_a_contract_violation() {
        assert_eq!(
            calculate_score(true, 1.0, 0, &config()),
            Err(GameError::invariant("time limit must be positive"))
        );
    }

    #[test]
    fn negative_or_nan_time_taken_is_rejected() {
        assert!(calculate_score(true, -0.5, 30, &config()).is_err());
        assert!(calculate_score(true, f64::NAN, 30, &config()).is_err());
    }

    proptest! {
        #[test]
        fn correct_score_stays_within_bounds(
            time_taken in 0.0f64..600.0,
            time_limit in 1u32..=300,
        ) {
            let score = calculate_score(true, time_taken, time_limit, &config()).unwrap();
            prop_assert!(score >= 1000);
            prop_assert!(score <= 1500);
        }

        #[test]
        fn score_is_monotonically_non_increasing_in_time(
            earlier in 0.0f64..600.0,
            delta in 0.0f64..600.0,
            time_limit in 1u32..=300,
        ) {
            let later = earlier + delta;
            let fast = calculate_score(true, earlier, time_limit, &config()).unwrap();
            let slow = calculate_score(true, later, time_limit, &config()).unwrap();
            prop_assert!(fast >= slow);
        }

        #[test]
        fn wrong_answers_always_score_zero(
            time_taken in 0.0f64..600.0,
            time_limit in 1u32..=300,
        ) {
            prop_assert_eq!(
                calculate_score(false, time_taken, time_limit, &config()).unwrap(),
                0
            );
        }
    }
}
