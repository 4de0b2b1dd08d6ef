//! Run options and their per-trial resolution.

use serde::{Deserialize, Serialize};

use ft_types::{config_error, validation_error, TrialDefinition, TuneResult};

pub const DEFAULT_REPETITIONS: usize = 10;
pub const DEFAULT_AI_MISALIGNMENT: f64 = 0.6;
pub const DEFAULT_SCORE_LIMIT: u32 = 11;
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_TIME_SCALE: f64 = 1.0;
pub const DEFAULT_GENERATIONS: usize = 1;
pub const DEFAULT_MUTATION_SURVIVORS: usize = 2;

/// Caller-supplied options for a tuning run. Missing keys in a JSON document
/// fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TuningOptions {
    /// Matches played per trial unless the trial overrides it.
    pub repetitions: usize,
    /// How far the AI paddles deviate from perfect play.
    pub ai_misalignment: f64,
    /// Points needed to win a match.
    pub score_limit: u32,
    /// Simulator calls in flight at once within one trial.
    pub concurrency: usize,
    pub time_scale: f64,
    pub generations: usize,
    /// Reports promoted to seed the next generation.
    pub mutation_survivors: usize,
}

impl Default for TuningOptions {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            ai_misalignment: DEFAULT_AI_MISALIGNMENT,
            score_limit: DEFAULT_SCORE_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            time_scale: DEFAULT_TIME_SCALE,
            generations: DEFAULT_GENERATIONS,
            mutation_survivors: DEFAULT_MUTATION_SURVIVORS,
        }
    }
}

impl TuningOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repetitions(mut self, n: usize) -> Self {
        self.repetitions = n;
        self
    }

    pub fn with_ai_misalignment(mut self, misalignment: f64) -> Self {
        self.ai_misalignment = misalignment;
        self
    }

    pub fn with_score_limit(mut self, limit: u32) -> Self {
        self.score_limit = limit;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    pub fn with_survivors(mut self, n: usize) -> Self {
        self.mutation_survivors = n;
        self
    }

    pub fn from_json_str(json: &str) -> TuneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject values no simulator can make sense of.
    pub fn validate(&self) -> TuneResult<()> {
        if !self.ai_misalignment.is_finite() {
            return Err(config_error!(
                "aiMisalignment must be finite, got {}",
                self.ai_misalignment
            ));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(config_error!(
                "timeScale must be a positive number, got {}",
                self.time_scale
            ));
        }
        Ok(())
    }
}

/// Options in effect for one trial: trial overrides win over caller options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrialOptions {
    pub repetitions: usize,
    pub ai_misalignment: f64,
    pub score_limit: u32,
    /// Batch size; always at least 1.
    pub concurrency: usize,
    pub time_scale: f64,
}

impl ResolvedTrialOptions {
    pub fn resolve(trial: &TrialDefinition, options: &TuningOptions) -> Self {
        Self {
            repetitions: trial.repetitions.unwrap_or(options.repetitions),
            ai_misalignment: trial.ai_misalignment.unwrap_or(options.ai_misalignment),
            score_limit: options.score_limit,
            concurrency: options.concurrency.max(1),
            time_scale: trial.time_scale.unwrap_or(options.time_scale),
        }
    }

    /// Same checks as [`TuningOptions::validate`], applied after trial
    /// overrides have been folded in.
    pub fn validate(&self, trial_id: &str) -> TuneResult<()> {
        if !self.ai_misalignment.is_finite() {
            return Err(validation_error!(
                "trial {trial_id}: aiMisalignment must be finite, got {}",
                self.ai_misalignment
            ));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(validation_error!(
                "trial {trial_id}: timeScale must be a positive number, got {}",
                self.time_scale
            ));
        }
        Ok(())
    }
}
