//! Single-parameter probes around a trial.
//!
//! Every numeric parameter of a trial is probed twice: once scaled up by the
//! mutation factor and once scaled down by it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ft_types::{ParameterValue, TrialDefinition, TuneResult};

use crate::config::TuningOptions;
use crate::executor::run_trial;
use crate::report::TrialRunReport;
use crate::simulator::MatchSimulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationDirection {
    Increase,
    Decrease,
}

/// One perturbation of one numeric parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationDescriptor {
    pub path: String,
    pub parameter: String,
    pub factor: f64,
    pub direction: MutationDirection,
}

impl MutationDescriptor {
    /// Human-readable probe label, e.g. `arena.blackHole.radius x2.000`.
    pub fn label(&self) -> String {
        let op = match self.direction {
            MutationDirection::Increase => 'x',
            MutationDirection::Decrease => '/',
        };
        format!("{}.{} {}{:.3}", self.path, self.parameter, op, self.factor)
    }

    fn apply_to(&self, value: f64) -> f64 {
        match self.direction {
            MutationDirection::Increase => value * self.factor,
            MutationDirection::Decrease => value / self.factor,
        }
    }
}

/// A numeric parameter that can be probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTarget {
    pub path: String,
    pub parameter: String,
    pub value: f64,
}

impl ParameterTarget {
    pub fn probe(&self, factor: f64, direction: MutationDirection) -> MutationDescriptor {
        MutationDescriptor {
            path: self.path.clone(),
            parameter: self.parameter.clone(),
            factor,
            direction,
        }
    }
}

/// Every numeric parameter of every override, in override order and then
/// parameter-name order. Flags and text are never mutated.
pub fn enumerate_mutable_parameters(trial: &TrialDefinition) -> Vec<ParameterTarget> {
    trial
        .overrides
        .iter()
        .flat_map(|o| {
            o.parameters.iter().filter_map(move |(name, value)| {
                value.as_number().map(|value| ParameterTarget {
                    path: o.path.clone(),
                    parameter: name.clone(),
                    value,
                })
            })
        })
        .collect()
}

/// A copy of `trial` with the described parameter scaled.
///
/// A missing path or a non-numeric parameter is not an error: the copy is
/// returned unchanged so one malformed override cannot abort a search.
pub fn apply_mutation(trial: &TrialDefinition, mutation: &MutationDescriptor) -> TrialDefinition {
    let mut mutated = trial.clone();
    let target = mutated
        .overrides
        .iter_mut()
        .find(|o| o.path == mutation.path)
        .and_then(|o| o.parameters.get_mut(&mutation.parameter));

    match target {
        Some(ParameterValue::Number(value)) => *value = mutation.apply_to(*value),
        _ => debug!(
            trial = %trial.id,
            probe = %mutation.label(),
            "mutation target missing or not numeric, left unchanged"
        ),
    }
    mutated
}

/// Base report plus one increase and one decrease probe per numeric
/// parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSetResult {
    pub base: TrialRunReport,
    pub mutations: Vec<TrialRunReport>,
    pub mutation_factor: f64,
}

impl MutationSetResult {
    /// Base first, then probes in run order.
    pub fn into_reports(self) -> Vec<TrialRunReport> {
        let mut reports = Vec::with_capacity(self.mutations.len() + 1);
        reports.push(self.base);
        reports.extend(self.mutations);
        reports
    }
}

/// Run `trial` unmodified, then every increase/decrease probe of its numeric
/// parameters. Probes run one trial at a time.
pub async fn run_trial_mutation_set<S>(
    simulator: &S,
    trial: &TrialDefinition,
    factor: f64,
    options: &TuningOptions,
) -> TuneResult<MutationSetResult>
where
    S: MatchSimulator + ?Sized,
{
    let base = run_trial(simulator, trial, options, None).await?;

    let targets = enumerate_mutable_parameters(trial);
    let mut mutations = Vec::with_capacity(targets.len() * 2);
    for target in &targets {
        for direction in [MutationDirection::Increase, MutationDirection::Decrease] {
            let descriptor = target.probe(factor, direction);
            debug!(trial = %trial.id, probe = %descriptor.label(), "running probe");
            let probe = apply_mutation(trial, &descriptor);
            mutations.push(run_trial(simulator, &probe, options, Some(descriptor)).await?);
        }
    }

    Ok(MutationSetResult {
        base,
        mutations,
        mutation_factor: factor,
    })
}
