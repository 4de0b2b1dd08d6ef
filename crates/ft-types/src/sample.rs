//! Raw results of one simulated match, as returned by a simulator.

use serde::{Deserialize, Serialize};

/// One side of the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Paddle direction changes made by each side during a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionChanges {
    pub left: u32,
    pub right: u32,
}

impl DirectionChanges {
    pub fn total(&self) -> u32 {
        self.left + self.right
    }
}

/// A single round (point) of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    /// Round duration in seconds.
    pub duration: f64,
    pub returns: u32,
    pub winner: Side,
    #[serde(default)]
    pub direction_changes: DirectionChanges,
    #[serde(default)]
    pub shot_clock_expired: bool,
}

/// A ball that got past a paddle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissEvent {
    /// The side that failed to return the ball.
    pub side: Side,
    /// Distance between paddle and ball at the moment of the miss.
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn gap(&self) -> u32 {
        self.left.abs_diff(self.right)
    }
}

/// Everything the engine needs to know about one simulated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSample {
    pub rounds: Vec<RoundRecord>,
    pub final_score: Score,
    /// Score gap at the end of the match.
    pub score_gap: f64,
    /// Largest score gap observed at any point during the match.
    pub max_score_gap: f64,
    #[serde(default)]
    pub misses: Vec<MissEvent>,
}
