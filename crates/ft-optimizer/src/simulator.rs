//! The simulator capability: the engine's only view of the game.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ft_types::{MatchSample, ModOverride, TrialDefinition};

/// Everything a simulator needs to play one match.
///
/// Each request owns its own copy of the trial and overrides, so concurrent
/// calls never share parameter maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub trial: TrialDefinition,
    pub parameter_overrides: Vec<ModOverride>,
    pub ai_misalignment: f64,
    pub score_limit: u32,
    pub time_scale: Option<f64>,
    /// 0-based repetition index within the trial, e.g. for seeding.
    pub repetition: usize,
}

/// Plays a single match.
///
/// Implementations may take arbitrarily long; the engine applies no timeout
/// and no retries. Wrap the simulator if bounded latency is needed.
#[async_trait]
pub trait MatchSimulator: Send + Sync {
    async fn run_match(&self, request: MatchRequest) -> anyhow::Result<MatchSample>;
}

#[async_trait]
impl<S: MatchSimulator + ?Sized> MatchSimulator for std::sync::Arc<S> {
    async fn run_match(&self, request: MatchRequest) -> anyhow::Result<MatchSample> {
        (**self).run_match(request).await
    }
}
