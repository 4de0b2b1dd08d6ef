//! Serializable results of trial runs and tuning runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ft_types::{MatchSample, TrialDefinition, TuneResult};

use crate::config::TuningOptions;
use crate::metrics::{MissSummary, RepetitionMetrics, RoundStatistics};
use crate::mutation::MutationDescriptor;
use crate::stats::{mean, summarize, PercentileSummary};

/// Unique tuning run identifier.
pub type TuningRunId = Uuid;

/// One simulated match of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepetitionResult {
    /// 0-based repetition index.
    pub index: usize,
    pub fun_score: f64,
    pub metrics: RepetitionMetrics,
}

/// Statistics over every repetition of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSummary {
    pub total_matches: usize,
    /// 0 when no matches were played.
    pub average_fun_score: f64,
    pub fun_score: PercentileSummary,
    /// Round statistics over the pooled rounds of all matches.
    #[serde(flatten)]
    pub rounds: RoundStatistics,
    pub misses: MissSummary,
    pub average_max_score_gap: f64,
    pub average_score_gap: f64,
    pub average_total_returns: f64,
    pub average_match_duration: f64,
}

impl TrialSummary {
    /// `samples` and `repetitions` must be in the same (index) order.
    pub fn aggregate(samples: &[MatchSample], repetitions: &[RepetitionResult]) -> Self {
        let fun_scores: Vec<f64> = repetitions.iter().map(|r| r.fun_score).collect();
        let per_match = |f: fn(&RepetitionMetrics) -> f64| {
            let values: Vec<f64> = repetitions.iter().map(|r| f(&r.metrics)).collect();
            mean(&values).unwrap_or(0.0)
        };

        Self {
            total_matches: repetitions.len(),
            average_fun_score: mean(&fun_scores).unwrap_or(0.0),
            fun_score: summarize(&fun_scores),
            rounds: RoundStatistics::from_rounds(samples.iter().flat_map(|s| &s.rounds)),
            misses: MissSummary::from_misses(samples.iter().flat_map(|s| &s.misses)),
            average_max_score_gap: per_match(|m| m.max_score_gap),
            average_score_gap: per_match(|m| m.score_gap),
            average_total_returns: per_match(|m| m.rounds.total_returns as f64),
            average_match_duration: per_match(|m| m.match_duration()),
        }
    }
}

/// Outcome of running one trial (a base trial or a mutation probe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRunReport {
    pub trial: TrialDefinition,
    pub mutation: Option<MutationDescriptor>,
    pub repetitions: Vec<RepetitionResult>,
    pub summary: TrialSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TrialRunReport {
    pub fn score(&self) -> f64 {
        self.summary.average_fun_score
    }

    /// Trial id, with the probe label appended for mutation probes.
    pub fn describe(&self) -> String {
        match &self.mutation {
            Some(mutation) => format!("{} [{}]", self.trial.id, mutation.label()),
            None => self.trial.id.clone(),
        }
    }
}

/// Base and probe reports of every population member in one generation, in
/// the order they were run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// 1-based generation index.
    pub generation: usize,
    pub mutation_factor: f64,
    pub trials: Vec<TrialRunReport>,
}

impl GenerationRecord {
    /// Reports sorted by descending average fun score. The sort is stable,
    /// so ties keep run order.
    pub fn ranked(&self) -> Vec<&TrialRunReport> {
        rank(self.trials.iter())
    }

    pub fn top(&self) -> Option<&TrialRunReport> {
        first_max(self.trials.iter())
    }
}

/// Final output of a tuning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunTuningReport {
    pub run_id: TuningRunId,
    pub options: TuningOptions,
    pub generations: Vec<GenerationRecord>,
    pub best_trial: Option<TrialRunReport>,
    pub recommended_config_patch: Option<serde_json::Value>,
    pub recommendations: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl FunTuningReport {
    /// The `n` highest-scoring reports across every generation.
    pub fn leaderboard(&self, n: usize) -> Vec<&TrialRunReport> {
        let mut ranked = rank(self.generations.iter().flat_map(|g| g.trials.iter()));
        ranked.truncate(n);
        ranked
    }

    pub fn to_json_pretty(&self) -> TuneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Highest-scoring report over all generations. Earlier reports win ties, so
/// this agrees with promoting a generation's top report only when it strictly
/// beats the best so far.
pub fn best_across(generations: &[GenerationRecord]) -> Option<&TrialRunReport> {
    first_max(generations.iter().flat_map(|g| g.trials.iter()))
}

fn first_max<'a>(reports: impl Iterator<Item = &'a TrialRunReport>) -> Option<&'a TrialRunReport> {
    reports.fold(None, |best, report| match best {
        Some(current) if report.score() <= current.score() => Some(current),
        _ => Some(report),
    })
}

fn rank<'a>(reports: impl Iterator<Item = &'a TrialRunReport>) -> Vec<&'a TrialRunReport> {
    let mut ranked: Vec<&TrialRunReport> = reports.collect();
    ranked.sort_by(|a, b| b.score().total_cmp(&a.score()));
    ranked
}
