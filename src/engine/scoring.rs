use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_SCORE: f64 = 10.0;
pub const DEFAULT_DECAY_FACTOR: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreParams {
    pub base_score: f64,
    pub decay_factor: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            decay_factor: DEFAULT_DECAY_FACTOR,
        }
    }
}

/// Score a completion that took `start..end` with the default parameters.
pub fn compute_score(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    compute_score_with(ScoreParams::default(), start, end)
}

/// An inverted range counts as zero elapsed time.
pub fn compute_score_with(params: ScoreParams, start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let secs = (end - start).num_milliseconds() as f64 / 1000.0;
    score_for_duration(params, secs)
}

/// `base / (1 + decay * secs)`, rounded half away from zero and clamped at 0.
pub fn score_for_duration(params: ScoreParams, secs: f64) -> u32 {
    let secs = secs.max(0.0);
    let score = params.base_score * (1.0 / (1.0 + params.decay_factor * secs));
    if !score.is_finite() || score <= 0.0 {
        return 0;
    }
    // `as` saturates at u32::MAX
    score.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn score_after(secs: i64) -> u32 {
        compute_score(start(), start() + Duration::seconds(secs))
    }

    #[test]
    fn test_instant_completion_scores_base() {
        assert_eq!(score_after(0), 10);
    }

    #[test]
    fn test_fast_completion() {
        assert!(score_after(5) >= 7);
    }

    #[test]
    fn test_medium_completion() {
        let score = score_after(30);
        assert!((2..7).contains(&score));
    }

    #[test]
    fn test_slow_completion() {
        assert!(score_after(120) <= 1);
    }

    #[test]
    fn test_rounds_half_up() {
        // 10 / (1 + 0.1 * 30) is exactly 2.5
        assert_eq!(score_after(30), 3);
        // 10 / (1 + 0.1 * 10) is exactly 5.0
        assert_eq!(score_after(10), 5);
        // 10 / 1.5 = 6.67
        assert_eq!(score_after(5), 7);
    }

    #[test]
    fn test_score_never_increases_with_duration() {
        let mut previous = u32::MAX;
        for secs in 0..600 {
            let score = score_after(secs);
            assert!(score <= previous, "score rose at {secs}s");
            previous = score;
        }
    }

    #[test]
    fn test_inverted_range_is_clamped() {
        let end = start() - Duration::seconds(30);
        assert_eq!(compute_score(start(), end), 10);
    }

    #[test]
    fn test_sub_second_precision() {
        let end = start() + Duration::milliseconds(4_500);
        // 10 / 1.45 = 6.9
        assert_eq!(compute_score(start(), end), 7);
    }

    #[test]
    fn test_custom_params() {
        let params = ScoreParams {
            base_score: 100.0,
            decay_factor: 0.5,
        };
        assert_eq!(score_for_duration(params, 2.0), 50);
    }

    #[test]
    fn test_never_negative() {
        let params = ScoreParams {
            base_score: -10.0,
            decay_factor: 0.1,
        };
        assert_eq!(score_for_duration(params, 5.0), 0);
        assert_eq!(score_for_duration(ScoreParams::default(), f64::INFINITY), 0);
        assert_eq!(score_for_duration(ScoreParams::default(), 1.0e12), 0);
    }
}
