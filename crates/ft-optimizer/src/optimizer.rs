//! Generational local search over trial parameters.
//!
//! Each generation runs the full mutation set of every population member,
//! ranks all resulting reports by average fun score and promotes the top
//! `mutation_survivors` trials to the next generation. The mutation factor
//! narrows every generation: 2.0, then `1 + 2^-(g-1)`.

use chrono::Utc;
use crossbeam_channel::Sender;
use tracing::info;
use uuid::Uuid;

use ft_types::{TrialDefinition, TuneResult};

use crate::config::{ResolvedTrialOptions, TuningOptions};
use crate::events::{StatusSink, TuningEvent};
use crate::mutation::run_trial_mutation_set;
use crate::patch::build_patch;
use crate::report::{best_across, FunTuningReport, GenerationRecord, TrialRunReport};
use crate::simulator::MatchSimulator;

/// Mutation factor of the first generation.
pub const INITIAL_MUTATION_FACTOR: f64 = 2.0;

pub const APPLY_PATCH_RECOMMENDATION: &str =
    "Apply the recommended config patch to the mod defaults and confirm it with a longer run before shipping.";

/// Mutation factor for a 1-based generation index. Greater than 1 and
/// strictly decreasing until `2^-(g-1)` drops below f64 precision (g > 53).
pub fn mutation_factor(generation: usize) -> f64 {
    if generation <= 1 {
        INITIAL_MUTATION_FACTOR
    } else {
        let exponent = i32::try_from(generation - 1).unwrap_or(i32::MAX);
        1.0 + 0.5f64.powi(exponent)
    }
}

/// Trials of the `survivors` best reports of a generation, ties broken by run
/// order. The copies carry no mutation or report lineage.
pub fn select_survivors(record: &GenerationRecord, survivors: usize) -> Vec<TrialDefinition> {
    record
        .ranked()
        .into_iter()
        .take(survivors)
        .map(|report| report.trial.clone())
        .collect()
}

/// Drives a tuning run. Sequential across generations and across population
/// members; the only concurrency is within one trial's repetitions.
#[derive(Debug, Clone)]
pub struct GenerationalOptimizer {
    options: TuningOptions,
    sink: StatusSink,
}

impl GenerationalOptimizer {
    pub fn new(options: TuningOptions) -> Self {
        Self {
            options,
            sink: StatusSink::disabled(),
        }
    }

    pub fn with_status_sink(mut self, tx: Sender<TuningEvent>) -> Self {
        self.sink = StatusSink::new(tx);
        self
    }

    pub fn options(&self) -> &TuningOptions {
        &self.options
    }

    /// Run every generation. A simulator failure aborts the run and nothing
    /// produced so far is returned.
    pub async fn run<S>(&self, simulator: &S, initial_trials: &[TrialDefinition]) -> TuneResult<FunTuningReport>
    where
        S: MatchSimulator + ?Sized,
    {
        self.options.validate()?;
        for trial in initial_trials {
            ResolvedTrialOptions::resolve(trial, &self.options).validate(&trial.id)?;
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total_generations = self.options.generations;
        info!(
            %run_id,
            trials = initial_trials.len(),
            generations = total_generations,
            "starting fun tuning run"
        );

        let mut population = initial_trials.to_vec();
        let mut generations: Vec<GenerationRecord> = Vec::with_capacity(total_generations);

        for generation in 1..=total_generations {
            let record = self
                .run_generation(simulator, generation, &population)
                .await?;
            population = select_survivors(&record, self.options.mutation_survivors);
            generations.push(record);

            let best_score = best_across(&generations).map(TrialRunReport::score);
            info!(
                %run_id,
                generation,
                survivors = population.len(),
                best_score = ?best_score,
                "generation complete"
            );
            self.sink.emit(TuningEvent::GenerationComplete {
                generation,
                total_generations,
                population: population.len(),
                mutation_factor: mutation_factor(generation),
                reports: generations.last().map_or(0, |g| g.trials.len()),
                best_score,
            });
        }

        let best_trial = best_across(&generations).cloned();
        let recommended_config_patch = best_trial.as_ref().map(|best| build_patch(&best.trial));
        let recommendations = recommendations(best_trial.as_ref());

        info!(
            %run_id,
            best = ?best_trial.as_ref().map(TrialRunReport::describe),
            "fun tuning run finished"
        );

        Ok(FunTuningReport {
            run_id,
            options: self.options.clone(),
            generations,
            best_trial,
            recommended_config_patch,
            recommendations,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn run_generation<S>(
        &self,
        simulator: &S,
        generation: usize,
        population: &[TrialDefinition],
    ) -> TuneResult<GenerationRecord>
    where
        S: MatchSimulator + ?Sized,
    {
        let total_generations = self.options.generations;
        let factor = mutation_factor(generation);
        info!(generation, factor, population = population.len(), "starting generation");
        self.sink.emit(TuningEvent::GenerationStart {
            generation,
            total_generations,
            population: population.len(),
            mutation_factor: factor,
        });

        let mut trials = Vec::new();
        for (trial_index, trial) in population.iter().enumerate() {
            self.sink.emit(TuningEvent::TrialStart {
                generation,
                total_generations,
                trial_index,
                population: population.len(),
                trial_id: trial.id.clone(),
                mutation_factor: factor,
            });

            let reports = run_trial_mutation_set(simulator, trial, factor, &self.options)
                .await?
                .into_reports();
            let best_score = reports
                .iter()
                .map(TrialRunReport::score)
                .fold(0.0, f64::max);

            self.sink.emit(TuningEvent::TrialComplete {
                generation,
                total_generations,
                trial_index,
                population: population.len(),
                trial_id: trial.id.clone(),
                mutation_factor: factor,
                reports: reports.len(),
                best_score,
            });
            trials.extend(reports);
        }

        Ok(GenerationRecord {
            generation,
            mutation_factor: factor,
            trials,
        })
    }
}

/// Convenience wrapper around [`GenerationalOptimizer::run`].
pub async fn run_fun_tuning<S>(
    simulator: &S,
    initial_trials: &[TrialDefinition],
    options: TuningOptions,
    status: Option<Sender<TuningEvent>>,
) -> TuneResult<FunTuningReport>
where
    S: MatchSimulator + ?Sized,
{
    let mut optimizer = GenerationalOptimizer::new(options);
    if let Some(tx) = status {
        optimizer = optimizer.with_status_sink(tx);
    }
    optimizer.run(simulator, initial_trials).await
}

fn recommendations(best: Option<&TrialRunReport>) -> Vec<String> {
    match best {
        Some(best) => vec![
            format!(
                "Best trial {} averaged a fun score of {:.3} over {} matches.",
                best.describe(),
                best.score(),
                best.summary.total_matches
            ),
            APPLY_PATCH_RECOMMENDATION.to_string(),
        ],
        None => vec!["No trial completed, so no configuration change is recommended.".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::report_with_score;

    #[test]
    fn mutation_factor_schedule() {
        assert_eq!(mutation_factor(1), 2.0);
        assert_eq!(mutation_factor(2), 1.5);
        assert_eq!(mutation_factor(3), 1.25);
        assert_eq!(mutation_factor(4), 1.125);

        let mut previous = mutation_factor(1);
        for generation in 2..40 {
            let factor = mutation_factor(generation);
            assert!(factor > 1.0);
            assert!(factor < previous);
            previous = factor;
        }
    }

    #[test]
    fn survivors_are_the_top_reports() {
        let mut reports = vec![
            report_with_score("a", 0.2),
            report_with_score("b", 0.9),
            report_with_score("c", 0.5),
            report_with_score("d", 0.9),
        ];
        reports[3].trial.label = Some("probe".into());
        let record = GenerationRecord {
            generation: 1,
            mutation_factor: 2.0,
            trials: reports,
        };

        let survivors = select_survivors(&record, 2);
        let ids: Vec<&str> = survivors.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
        assert_eq!(survivors[1].label.as_deref(), Some("probe"));

        assert_eq!(select_survivors(&record, 10).len(), 4);
        assert!(select_survivors(&record, 0).is_empty());
    }

    #[test]
    fn recommendations_mention_the_best_trial() {
        let best = report_with_score("winner", 0.8125);
        let lines = recommendations(Some(&best));
        assert!(lines[0].contains("winner"));
        assert!(lines[0].contains("0.812") || lines[0].contains("0.813"));
        assert_eq!(lines[1], APPLY_PATCH_RECOMMENDATION);

        assert_eq!(recommendations(None).len(), 1);
    }
}
