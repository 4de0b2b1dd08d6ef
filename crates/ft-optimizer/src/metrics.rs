//! Gameplay statistics derived from raw match samples.
//!
//! [`RoundStatistics`] is computed over any collection of rounds, so the same
//! code serves a single match ([`RepetitionMetrics::from_sample`]) and the
//! pooled rounds of every repetition of a trial.

use serde::{Deserialize, Serialize};

use ft_types::{MatchSample, MissEvent, RoundRecord, Score, Side};

use crate::stats::{mean, summarize, PercentileSummary};

/// Win rate used when no rounds were played: neither side is favoured.
pub const NEUTRAL_WIN_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionChangeSummary {
    pub left_average: f64,
    pub right_average: f64,
    /// Percentiles of both sides' changes summed per round.
    pub combined: PercentileSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissSummary {
    pub count: usize,
    pub left: usize,
    pub right: usize,
    pub average_distance: Option<f64>,
    pub distance: PercentileSummary,
}

impl MissSummary {
    pub fn from_misses<'a>(misses: impl IntoIterator<Item = &'a MissEvent>) -> Self {
        let mut left = 0;
        let mut right = 0;
        let mut distances = Vec::new();
        for miss in misses {
            match miss.side {
                Side::Left => left += 1,
                Side::Right => right += 1,
            }
            distances.push(miss.distance);
        }

        Self {
            count: distances.len(),
            left,
            right,
            average_distance: mean(&distances),
            distance: summarize(&distances),
        }
    }
}

/// Round-level statistics over an arbitrary set of rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStatistics {
    pub total_rounds: usize,
    pub left_wins: usize,
    pub right_wins: usize,
    pub left_win_rate: f64,
    pub right_win_rate: f64,
    pub round_duration: PercentileSummary,
    pub returns_per_round: PercentileSummary,
    pub direction_changes: DirectionChangeSummary,
    pub shot_clock_expiration_rate: f64,
    pub total_returns: u64,
    /// Sum of all round durations, in seconds.
    pub total_duration: f64,
}

impl RoundStatistics {
    pub fn from_rounds<'a>(rounds: impl IntoIterator<Item = &'a RoundRecord>) -> Self {
        let mut left_wins = 0;
        let mut right_wins = 0;
        let mut expired: u64 = 0;
        let mut total_returns: u64 = 0;
        let mut left_changes: u64 = 0;
        let mut right_changes: u64 = 0;
        let mut durations = Vec::new();
        let mut returns = Vec::new();
        let mut combined_changes = Vec::new();

        for round in rounds {
            match round.winner {
                Side::Left => left_wins += 1,
                Side::Right => right_wins += 1,
            }
            if round.shot_clock_expired {
                expired += 1;
            }
            total_returns += u64::from(round.returns);
            left_changes += u64::from(round.direction_changes.left);
            right_changes += u64::from(round.direction_changes.right);
            durations.push(round.duration);
            returns.push(f64::from(round.returns));
            combined_changes.push(f64::from(round.direction_changes.total()));
        }

        let total_rounds = durations.len();
        let per_round = |count: u64| {
            if total_rounds == 0 {
                0.0
            } else {
                count as f64 / total_rounds as f64
            }
        };

        Self {
            total_rounds,
            left_wins,
            right_wins,
            left_win_rate: win_rate(left_wins, total_rounds),
            right_win_rate: win_rate(right_wins, total_rounds),
            round_duration: summarize(&durations),
            returns_per_round: summarize(&returns),
            direction_changes: DirectionChangeSummary {
                left_average: per_round(left_changes),
                right_average: per_round(right_changes),
                combined: summarize(&combined_changes),
            },
            shot_clock_expiration_rate: per_round(expired),
            total_returns,
            total_duration: durations.iter().sum(),
        }
    }
}

fn win_rate(wins: usize, total: usize) -> f64 {
    if total == 0 {
        NEUTRAL_WIN_RATE
    } else {
        wins as f64 / total as f64
    }
}

/// Aggregate statistics of one simulated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepetitionMetrics {
    #[serde(flatten)]
    pub rounds: RoundStatistics,
    pub misses: MissSummary,
    pub final_score: Score,
    pub score_gap: f64,
    pub max_score_gap: f64,
}

impl RepetitionMetrics {
    pub fn from_sample(sample: &MatchSample) -> Self {
        Self {
            rounds: RoundStatistics::from_rounds(&sample.rounds),
            misses: MissSummary::from_misses(&sample.misses),
            final_score: sample.final_score,
            score_gap: sample.score_gap,
            max_score_gap: sample.max_score_gap,
        }
    }

    /// Sum of the round durations, in seconds.
    pub fn match_duration(&self) -> f64 {
        self.rounds.total_duration
    }
}
