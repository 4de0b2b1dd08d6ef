//! Composite fun score.
//!
//! Six sub-scores, each clamped to `[0, 1]`, are averaged with equal weight.
//! The band edges and divisors below are tunable heuristics rather than
//! protocol constants.

use serde::{Deserialize, Serialize};

use crate::metrics::RepetitionMetrics;

/// Median round durations inside this band (seconds) score a full point.
pub const DURATION_BAND: (f64, f64) = (5.0, 30.0);
/// Falloff window below the band, in seconds.
pub const DURATION_FALLOFF_BELOW: f64 = 5.0;
/// Falloff window above the band, in seconds.
pub const DURATION_FALLOFF_ABOVE: f64 = 30.0;
/// Median returns per round that earn a full point.
pub const TARGET_RETURNS_PER_ROUND: f64 = 8.0;
/// Median direction changes per round tolerated without penalty.
pub const DIRECTION_CHANGE_ALLOWANCE: f64 = 10.0;
/// Direction changes past the allowance over which the score falls to zero.
pub const DIRECTION_CHANGE_FALLOFF: f64 = 10.0;

/// Individual fitness terms, useful for explaining a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessBreakdown {
    pub balance: f64,
    pub gap: f64,
    pub duration: f64,
    pub returns: f64,
    pub shot_clock: f64,
    pub direction_changes: f64,
}

impl FitnessBreakdown {
    pub fn evaluate(metrics: &RepetitionMetrics, score_limit: u32) -> Self {
        let rounds = &metrics.rounds;
        // Missing medians (no rounds) are scored as zero.
        let median_duration = rounds.round_duration.p50.unwrap_or(0.0);
        let median_returns = rounds.returns_per_round.p50.unwrap_or(0.0);
        let median_changes = rounds.direction_changes.combined.p50.unwrap_or(0.0);

        Self {
            balance: unit(1.0 - (rounds.left_win_rate - 0.5).abs() * 2.0),
            gap: unit(1.0 - metrics.max_score_gap / f64::from(score_limit.max(1))),
            duration: unit(duration_score(median_duration)),
            returns: unit((median_returns / TARGET_RETURNS_PER_ROUND).min(1.0)),
            shot_clock: unit(1.0 - rounds.shot_clock_expiration_rate),
            direction_changes: unit(direction_change_score(median_changes)),
        }
    }

    pub fn terms(&self) -> [f64; 6] {
        [
            self.balance,
            self.gap,
            self.duration,
            self.returns,
            self.shot_clock,
            self.direction_changes,
        ]
    }

    /// Unweighted mean of the six terms, clamped to `[0, 1]`.
    pub fn total(&self) -> f64 {
        let terms = self.terms();
        unit(terms.iter().sum::<f64>() / terms.len() as f64)
    }
}

/// Fun score of one match in `[0, 1]`, for any input including NaN and
/// out-of-range metrics.
pub fn score(metrics: &RepetitionMetrics, score_limit: u32) -> f64 {
    FitnessBreakdown::evaluate(metrics, score_limit).total()
}

fn duration_score(median: f64) -> f64 {
    let (low, high) = DURATION_BAND;
    if median < low {
        1.0 - (low - median) / DURATION_FALLOFF_BELOW
    } else if median > high {
        1.0 - (median - high) / DURATION_FALLOFF_ABOVE
    } else {
        1.0
    }
}

fn direction_change_score(median: f64) -> f64 {
    if median <= DIRECTION_CHANGE_ALLOWANCE {
        1.0
    } else {
        1.0 - (median - DIRECTION_CHANGE_ALLOWANCE) / DIRECTION_CHANGE_FALLOFF
    }
}

/// Clamp to `[0, 1]`; NaN maps to 0.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
