//! # ft-optimizer
//!
//! Fun-score tuning for FunTune.
//!
//! Drives an opaque match simulator with perturbed mod parameters, turns
//! each match into percentile-based gameplay statistics, scores them with a
//! composite fun heuristic and runs a generational probe-up / probe-down
//! search to recommend better parameter values.

mod config;
mod events;
mod executor;
mod fitness;
mod metrics;
mod mutation;
mod optimizer;
mod patch;
mod report;
mod simulator;
mod stats;

pub use config::{
    ResolvedTrialOptions, TuningOptions, DEFAULT_AI_MISALIGNMENT, DEFAULT_CONCURRENCY,
    DEFAULT_GENERATIONS, DEFAULT_MUTATION_SURVIVORS, DEFAULT_REPETITIONS, DEFAULT_SCORE_LIMIT,
    DEFAULT_TIME_SCALE,
};
pub use events::{StatusSink, TuningEvent};
pub use executor::run_trial;
pub use fitness::{score, FitnessBreakdown};
pub use metrics::{
    DirectionChangeSummary, MissSummary, RepetitionMetrics, RoundStatistics, NEUTRAL_WIN_RATE,
};
pub use mutation::{
    apply_mutation, enumerate_mutable_parameters, run_trial_mutation_set, MutationDescriptor,
    MutationDirection, MutationSetResult, ParameterTarget,
};
pub use optimizer::{
    mutation_factor, run_fun_tuning, select_survivors, GenerationalOptimizer,
    APPLY_PATCH_RECOMMENDATION, INITIAL_MUTATION_FACTOR,
};
pub use patch::build_patch;
pub use report::{
    best_across, FunTuningReport, GenerationRecord, RepetitionResult, TrialRunReport,
    TrialSummary, TuningRunId,
};
pub use simulator::{MatchRequest, MatchSimulator};
pub use stats::{mean, percentile, summarize, PercentileSummary};
