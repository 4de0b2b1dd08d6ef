//! Progress events emitted while a tuning run is in progress.

use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Progress of a tuning run. Generations are 1-based, trial indices 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TuningEvent {
    #[serde(rename_all = "camelCase")]
    GenerationStart {
        generation: usize,
        total_generations: usize,
        population: usize,
        mutation_factor: f64,
    },
    #[serde(rename_all = "camelCase")]
    TrialStart {
        generation: usize,
        total_generations: usize,
        trial_index: usize,
        population: usize,
        trial_id: String,
        mutation_factor: f64,
    },
    #[serde(rename_all = "camelCase")]
    TrialComplete {
        generation: usize,
        total_generations: usize,
        trial_index: usize,
        population: usize,
        trial_id: String,
        mutation_factor: f64,
        /// Base plus probe reports produced for this trial.
        reports: usize,
        best_score: f64,
    },
    #[serde(rename_all = "camelCase")]
    GenerationComplete {
        generation: usize,
        total_generations: usize,
        population: usize,
        mutation_factor: f64,
        reports: usize,
        /// Best average fun score seen so far in the run, if any.
        best_score: Option<f64>,
    },
}

impl TuningEvent {
    pub fn generation(&self) -> usize {
        match self {
            Self::GenerationStart { generation, .. }
            | Self::TrialStart { generation, .. }
            | Self::TrialComplete { generation, .. }
            | Self::GenerationComplete { generation, .. } => *generation,
        }
    }
}

/// Optional, non-blocking outlet for [`TuningEvent`]s.
///
/// Delivery is best effort: a full or disconnected channel is logged and
/// otherwise ignored, so the sink can never stall or fail a run.
#[derive(Debug, Clone, Default)]
pub struct StatusSink {
    tx: Option<Sender<TuningEvent>>,
}

impl StatusSink {
    pub fn new(tx: Sender<TuningEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: TuningEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(generation = event.generation(), "status channel full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("status channel disconnected");
            }
        }
    }
}
