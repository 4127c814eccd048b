//! Bracket evaluation: ranking the trials of the previous round.

use std::cmp::Ordering;
use std::sync::Arc;

use hypertune_domain::{ManagerClient, WorkerState};
use hypertune_errors::TuneResult;
use tracing::{debug, warn};

use crate::state::HyperbandState;

/// Aggregated objective value of one evaluated trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialScore {
    pub trial_id: String,
    pub value: f64,
}

/// A ranked generation of trials, sorted descending by score so that
/// maximization takes the prefix and minimization takes the suffix.
pub type Bracket = Vec<TrialScore>;

pub struct BracketEvaluator {
    manager: Arc<dyn ManagerClient>,
}

impl BracketEvaluator {
    pub fn new(manager: Arc<dyn ManagerClient>) -> Self {
        Self { manager }
    }

    /// Queries workers and their objective metric for every evaluating
    /// trial. Returns `Ok(None)` while any worker is still short of
    /// COMPLETED (or a trial has no workers yet); the controller must make
    /// no suggestions on that tick. A missing or unparseable metric value
    /// for a completed worker degrades to 0.0.
    pub async fn evaluate(
        &self,
        study_id: &str,
        state: &HyperbandState,
    ) -> TuneResult<Option<Bracket>> {
        let mut bracket = Bracket::with_capacity(state.evaluating_trials.len());
        for trial_id in &state.evaluating_trials {
            let workers = self.manager.get_workers(study_id, trial_id).await?;
            if workers.is_empty() {
                debug!("trial {trial_id} has no workers yet");
                return Ok(None);
            }
            let worker_ids: Vec<String> =
                workers.iter().map(|w| w.worker_id.clone()).collect();
            let log_sets = self
                .manager
                .get_metrics(
                    study_id,
                    &worker_ids,
                    std::slice::from_ref(&state.objective_value_name),
                )
                .await?;

            let mut sum = 0.0;
            for set in &log_sets {
                if set.worker_status != WorkerState::Completed {
                    debug!(
                        "worker {} of trial {trial_id} is {:?}, bracket not ready",
                        set.worker_id, set.worker_status
                    );
                    return Ok(None);
                }
                sum += last_metric_value(set, &state.objective_value_name);
            }
            bracket.push(TrialScore {
                trial_id: trial_id.clone(),
                value: sum / workers.len() as f64,
            });
        }
        bracket.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        Ok(Some(bracket))
    }
}

pub(crate) fn last_metric_value(set: &hypertune_domain::MetricsLogSet, metric: &str) -> f64 {
    let last = set
        .metrics_logs
        .first()
        .and_then(|log| log.values.last());
    match last {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(
                "unparseable {metric} value {raw:?} from worker {}, using 0",
                set.worker_id
            );
            0.0
        }),
        None => {
            warn!("worker {} reported no {metric} values, using 0", set.worker_id);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypertune_testing_utils::{test_worker, MockManagerClient, StudyConfigBuilder};

    fn state_with_trials(trials: &[&str]) -> HyperbandState {
        HyperbandState {
            eta: 3.0,
            s_max: 4,
            b_l: 405.0,
            r_l: 81.0,
            r: 1.0,
            n: 81,
            shloopitr: 1,
            current_s: 4,
            resource_name: "epochs".to_string(),
            objective_value_name: "accuracy".to_string(),
            evaluating_trials: trials.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn manager() -> MockManagerClient {
        MockManagerClient::new().with_study(
            "s-1",
            StudyConfigBuilder::new()
                .with_double_param("lr", "0.001", "0.1")
                .with_int_param("epochs", "1", "81")
                .build(),
        )
    }

    #[tokio::test]
    async fn test_not_ready_while_any_worker_is_incomplete() {
        let manager = manager();
        manager.add_worker(test_worker("w-1", "s-1", "t-1", WorkerState::Completed));
        manager.add_worker(test_worker("w-2", "s-1", "t-2", WorkerState::Running));
        manager.set_metrics("w-1", WorkerState::Completed, "accuracy", &["0.9"]);
        manager.set_metrics("w-2", WorkerState::Running, "accuracy", &["0.5"]);

        let evaluator = BracketEvaluator::new(Arc::new(manager));
        let bracket = evaluator
            .evaluate("s-1", &state_with_trials(&["t-1", "t-2"]))
            .await
            .unwrap();
        assert!(bracket.is_none());
    }

    #[tokio::test]
    async fn test_not_ready_when_a_trial_has_no_workers() {
        let evaluator = BracketEvaluator::new(Arc::new(manager()));
        let bracket = evaluator
            .evaluate("s-1", &state_with_trials(&["t-1"]))
            .await
            .unwrap();
        assert!(bracket.is_none());
    }

    #[tokio::test]
    async fn test_scores_average_last_values_across_workers() {
        let manager = manager();
        manager.add_worker(test_worker("w-1", "s-1", "t-1", WorkerState::Completed));
        manager.add_worker(test_worker("w-2", "s-1", "t-1", WorkerState::Completed));
        manager.set_metrics("w-1", WorkerState::Completed, "accuracy", &["0.1", "0.8"]);
        manager.set_metrics("w-2", WorkerState::Completed, "accuracy", &["0.2", "0.6"]);

        let evaluator = BracketEvaluator::new(Arc::new(manager));
        let bracket = evaluator
            .evaluate("s-1", &state_with_trials(&["t-1"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bracket.len(), 1);
        // Mean of the last values 0.8 and 0.6.
        assert!((bracket[0].value - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_bracket_is_sorted_descending() {
        let manager = manager();
        for (trial, worker, value) in
            [("t-1", "w-1", "0.2"), ("t-2", "w-2", "0.9"), ("t-3", "w-3", "0.5")]
        {
            manager.add_worker(test_worker(worker, "s-1", trial, WorkerState::Completed));
            manager.set_metrics(worker, WorkerState::Completed, "accuracy", &[value]);
        }

        let evaluator = BracketEvaluator::new(Arc::new(manager));
        let bracket = evaluator
            .evaluate("s-1", &state_with_trials(&["t-1", "t-2", "t-3"]))
            .await
            .unwrap()
            .unwrap();
        let order: Vec<&str> = bracket.iter().map(|s| s.trial_id.as_str()).collect();
        assert_eq!(order, vec!["t-2", "t-3", "t-1"]);
    }

    #[tokio::test]
    async fn test_unparseable_metric_degrades_to_zero() {
        let manager = manager();
        manager.add_worker(test_worker("w-1", "s-1", "t-1", WorkerState::Completed));
        manager.set_metrics("w-1", WorkerState::Completed, "accuracy", &["not-a-number"]);

        let evaluator = BracketEvaluator::new(Arc::new(manager));
        let bracket = evaluator
            .evaluate("s-1", &state_with_trials(&["t-1"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bracket[0].value, 0.0);
    }
}
