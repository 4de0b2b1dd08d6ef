//! Runs the repetitions of one trial against a simulator in bounded batches.

use chrono::Utc;
use futures::future::try_join_all;
use tracing::debug;

use ft_types::{MatchSample, TrialDefinition, TuneError, TuneResult};

use crate::config::{ResolvedTrialOptions, TuningOptions};
use crate::fitness;
use crate::metrics::RepetitionMetrics;
use crate::mutation::MutationDescriptor;
use crate::report::{RepetitionResult, TrialRunReport, TrialSummary};
use crate::simulator::{MatchRequest, MatchSimulator};

/// Play every repetition of `trial` and score it.
///
/// Repetitions are dispatched in batches of `concurrency` calls; a batch must
/// finish completely before the next one starts. Invalid resolved options are
/// rejected before any call, and the first simulator error aborts the trial.
pub async fn run_trial<S>(
    simulator: &S,
    trial: &TrialDefinition,
    options: &TuningOptions,
    mutation: Option<MutationDescriptor>,
) -> TuneResult<TrialRunReport>
where
    S: MatchSimulator + ?Sized,
{
    let resolved = ResolvedTrialOptions::resolve(trial, options);
    resolved.validate(&trial.id)?;
    let started_at = Utc::now();

    let mut played: Vec<(usize, MatchSample)> = Vec::with_capacity(resolved.repetitions);
    let mut batch_start = 0;
    while batch_start < resolved.repetitions {
        let batch_end = (batch_start + resolved.concurrency).min(resolved.repetitions);
        debug!(
            trial = %trial.id,
            from = batch_start,
            to = batch_end,
            "dispatching repetition batch"
        );

        let calls = (batch_start..batch_end).map(|index| {
            let request = build_request(trial, &resolved, index);
            async move {
                simulator
                    .run_match(request)
                    .await
                    .map(|sample| (index, sample))
                    .map_err(|source| TuneError::simulator(trial.id.as_str(), index, source))
            }
        });
        played.extend(try_join_all(calls).await?);
        batch_start = batch_end;
    }

    // Completion order is up to the simulator; restore repetition order.
    played.sort_by_key(|(index, _)| *index);

    let repetitions: Vec<RepetitionResult> = played
        .iter()
        .map(|(index, sample)| {
            let metrics = RepetitionMetrics::from_sample(sample);
            RepetitionResult {
                index: *index,
                fun_score: fitness::score(&metrics, resolved.score_limit),
                metrics,
            }
        })
        .collect();
    let samples: Vec<MatchSample> = played.into_iter().map(|(_, sample)| sample).collect();
    let summary = TrialSummary::aggregate(&samples, &repetitions);

    debug!(
        trial = %trial.id,
        matches = summary.total_matches,
        score = summary.average_fun_score,
        "trial finished"
    );

    Ok(TrialRunReport {
        trial: trial.clone(),
        mutation,
        repetitions,
        summary,
        started_at,
        finished_at: Utc::now(),
    })
}

fn build_request(trial: &TrialDefinition, resolved: &ResolvedTrialOptions, repetition: usize) -> MatchRequest {
    MatchRequest {
        trial: trial.clone(),
        parameter_overrides: trial.overrides.clone(),
        ai_misalignment: resolved.ai_misalignment,
        score_limit: resolved.score_limit,
        time_scale: Some(resolved.time_scale),
        repetition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ft_types::{DirectionChanges, ModOverride, RoundRecord, Score, Side};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn sample(rounds: usize) -> MatchSample {
        MatchSample {
            rounds: (0..rounds)
                .map(|i| RoundRecord {
                    duration: 12.0,
                    returns: 8,
                    winner: if i % 2 == 0 { Side::Left } else { Side::Right },
                    direction_changes: DirectionChanges { left: 2, right: 2 },
                    shot_clock_expired: false,
                })
                .collect(),
            final_score: Score { left: 6, right: 5 },
            score_gap: 1.0,
            max_score_gap: 2.0,
            misses: Vec::new(),
        }
    }

    /// Later repetitions finish first, and the peak number of calls in
    /// flight is recorded.
    #[derive(Default)]
    struct ReorderingSimulator {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        requests: Mutex<Vec<MatchRequest>>,
    }

    #[async_trait]
    impl MatchSimulator for ReorderingSimulator {
        async fn run_match(&self, request: MatchRequest) -> anyhow::Result<MatchSample> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let delay = 20u64.saturating_sub(request.repetition as u64 * 3);
            let rounds = request.repetition + 1;
            self.requests.lock().unwrap().push(request);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(sample(rounds))
        }
    }

    struct FailingSimulator {
        fail_at: usize,
    }

    #[async_trait]
    impl MatchSimulator for FailingSimulator {
        async fn run_match(&self, request: MatchRequest) -> anyhow::Result<MatchSample> {
            if request.repetition == self.fail_at {
                anyhow::bail!("engine crashed");
            }
            Ok(sample(2))
        }
    }

    /// Repetition 0 is slow; start and finish of every call is logged.
    #[derive(Default)]
    struct TimelineSimulator {
        timeline: Mutex<Vec<(&'static str, usize)>>,
    }

    #[async_trait]
    impl MatchSimulator for TimelineSimulator {
        async fn run_match(&self, request: MatchRequest) -> anyhow::Result<MatchSample> {
            let index = request.repetition;
            self.timeline.lock().unwrap().push(("start", index));
            let delay = if index == 0 { 40 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.timeline.lock().unwrap().push(("end", index));
            Ok(sample(1))
        }
    }

    fn trial() -> TrialDefinition {
        TrialDefinition::new("gopher")
            .with_override(ModOverride::new("arena.gopher").with_parameter("speed", 3.0))
    }

    #[tokio::test]
    async fn yields_every_repetition_in_index_order() {
        for concurrency in [1, 2, 3, 7, 50] {
            let simulator = ReorderingSimulator::default();
            let options = TuningOptions::new()
                .with_repetitions(7)
                .with_concurrency(concurrency);

            let report = run_trial(&simulator, &trial(), &options, None).await.unwrap();

            let indices: Vec<usize> = report.repetitions.iter().map(|r| r.index).collect();
            assert_eq!(indices, (0..7).collect::<Vec<_>>());
            for repetition in &report.repetitions {
                assert_eq!(repetition.metrics.rounds.total_rounds, repetition.index + 1);
            }
            assert_eq!(report.summary.total_matches, 7);
            assert_eq!(report.summary.rounds.total_rounds, (1..=7).sum::<usize>());
            assert!(simulator.peak.load(Ordering::SeqCst) <= concurrency.min(7));
        }
    }

    #[tokio::test]
    async fn batches_run_concurrently() {
        let simulator = ReorderingSimulator::default();
        let options = TuningOptions::new().with_repetitions(4).with_concurrency(4);
        run_trial(&simulator, &trial(), &options, None).await.unwrap();
        assert_eq!(simulator.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn next_batch_waits_for_the_slowest_call() {
        let simulator = TimelineSimulator::default();
        let options = TuningOptions::new().with_repetitions(4).with_concurrency(2);
        run_trial(&simulator, &trial(), &options, None).await.unwrap();

        let timeline = simulator.timeline.lock().unwrap();
        let at = |event: (&'static str, usize)| timeline.iter().position(|e| *e == event).unwrap();
        for second_batch in [2, 3] {
            assert!(at(("start", second_batch)) > at(("end", 0)));
            assert!(at(("start", second_batch)) > at(("end", 1)));
        }
        assert!(at(("start", 1)) < at(("end", 0)));
    }

    #[tokio::test]
    async fn invalid_trial_overrides_never_reach_the_simulator() {
        let simulator = ReorderingSimulator::default();
        let trial = trial().with_time_scale(-3.0);

        let err = run_trial(&simulator, &trial, &TuningOptions::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TuneError::Validation(_)));
        assert!(simulator.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn requests_carry_resolved_options_and_owned_overrides() {
        let simulator = ReorderingSimulator::default();
        let options = TuningOptions::new().with_repetitions(2).with_score_limit(7);
        let trial = trial().with_ai_misalignment(0.2).with_time_scale(4.0);

        run_trial(&simulator, &trial, &options, None).await.unwrap();

        let requests = simulator.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.ai_misalignment, 0.2);
            assert_eq!(request.score_limit, 7);
            assert_eq!(request.time_scale, Some(4.0));
            assert_eq!(request.parameter_overrides, trial.overrides);
        }
    }

    #[tokio::test]
    async fn zero_repetitions_produce_an_empty_report() {
        let simulator = ReorderingSimulator::default();
        let trial = trial().with_repetitions(0);
        let report = run_trial(&simulator, &trial, &TuningOptions::default(), None)
            .await
            .unwrap();

        assert!(report.repetitions.is_empty());
        assert_eq!(report.summary.total_matches, 0);
        assert_eq!(report.summary.average_fun_score, 0.0);
        assert!(simulator.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn simulator_failure_aborts_the_trial() {
        let simulator = FailingSimulator { fail_at: 3 };
        let options = TuningOptions::new().with_repetitions(5).with_concurrency(2);

        let err = run_trial(&simulator, &trial(), &options, None).await.unwrap_err();
        match err {
            TuneError::Simulator { trial_id, repetition, .. } => {
                assert_eq!(trial_id, "gopher");
                assert_eq!(repetition, 3);
            }
            other => panic!("expected simulator error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fun_scores_are_in_unit_interval() {
        let simulator = ReorderingSimulator::default();
        let options = TuningOptions::new().with_repetitions(3);
        let report = run_trial(&simulator, &trial(), &options, None).await.unwrap();
        for repetition in &report.repetitions {
            assert!((0.0..=1.0).contains(&repetition.fun_score));
        }
        assert!(report.mutation.is_none());
        assert!(report.finished_at >= report.started_at);
    }
}
