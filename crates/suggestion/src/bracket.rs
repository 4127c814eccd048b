//! Bracket generation: fresh random generations and promoted survivors.

use std::sync::Arc;

use hypertune_domain::{
    ManagerClient, OptimizationType, Parameter, ParameterType, Trial,
};
use hypertune_errors::{TuneError, TuneResult};
use tracing::info;

use crate::evaluator::Bracket;
use crate::random::RandomSampler;
use crate::state::HyperbandState;

pub struct BracketGenerator {
    manager: Arc<dyn ManagerClient>,
    sampler: RandomSampler,
}

impl BracketGenerator {
    pub fn new(manager: Arc<dyn ManagerClient>, sampler: RandomSampler) -> Self {
        Self { manager, sampler }
    }

    /// Cold-start generation: `n` trials with every parameter drawn
    /// uniformly from its feasible space, except the resource parameter
    /// which is pinned to `r`. Each trial is registered with the Manager;
    /// the issued ids and trial objects are returned in creation order.
    pub async fn master(
        &self,
        study_id: &str,
        n: i32,
        r: f64,
        state: &HyperbandState,
    ) -> TuneResult<(Vec<String>, Vec<Trial>)> {
        info!("making master bracket of {n} trials");
        let study = self.manager.get_study(study_id).await?;
        let mut trial_ids = Vec::with_capacity(n.max(0) as usize);
        let mut trials = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            let mut trial = Trial::new(study_id);
            for pc in &study.parameter_configs {
                let value = if pc.name == state.resource_name {
                    format_resource(r, pc.parameter_type)
                } else {
                    self.sampler.sample(pc)
                };
                trial.parameter_set.push(Parameter {
                    name: pc.name.clone(),
                    parameter_type: pc.parameter_type,
                    value,
                });
            }
            let trial_id = self.manager.create_trial(&trial).await?;
            trial.trial_id = trial_id.clone();
            trial_ids.push(trial_id);
            trials.push(trial);
        }
        Ok((trial_ids, trials))
    }

    /// Promotion: re-launch the top `n` survivors of the ranked parent at
    /// the larger resource `r_i`. Every non-resource parameter is preserved
    /// verbatim from the parent trial.
    ///
    /// The parent is sorted descending by score, so maximization takes the
    /// head and minimization the tail. The tail is the better half for
    /// minimization only when a lower stored metric value means a better
    /// trial; if the metric stream is not aligned with the optimization
    /// direction the selection inverts.
    pub async fn child(
        &self,
        parent: &Bracket,
        study_id: &str,
        n: i32,
        r_i: f64,
        state: &HyperbandState,
    ) -> TuneResult<(Vec<String>, Vec<Trial>)> {
        info!("making child bracket of {n} survivors");
        let study = self.manager.get_study(study_id).await?;
        let n = (n.max(0) as usize).min(parent.len());
        let survivors = match study.optimization_type {
            OptimizationType::Minimize => &parent[parent.len() - n..],
            OptimizationType::Maximize => &parent[..n],
        };
        let resource_type = study
            .parameter_config(&state.resource_name)
            .map(|pc| pc.parameter_type)
            .ok_or_else(|| {
                TuneError::config_error(format!(
                    "resource parameter {} is not declared in the study",
                    state.resource_name
                ))
            })?;

        let known_trials = self.manager.get_trials(study_id).await?;
        let mut trial_ids = Vec::with_capacity(n);
        let mut trials = Vec::with_capacity(n);
        for score in survivors {
            let parent_trial = known_trials
                .iter()
                .find(|t| t.trial_id == score.trial_id)
                .ok_or_else(|| TuneError::trial_not_found(&score.trial_id))?;
            let mut trial = Trial::new(study_id);
            trial.parameter_set = parent_trial.parameter_set.clone();
            for p in &mut trial.parameter_set {
                if p.name == state.resource_name {
                    p.value = format_resource(r_i, resource_type);
                }
            }
            let trial_id = self.manager.create_trial(&trial).await?;
            trial.trial_id = trial_id.clone();
            trial_ids.push(trial_id);
            trials.push(trial);
        }
        Ok((trial_ids, trials))
    }
}

/// The resource value is rewritten each round, typed per its declared
/// parameter type: truncated decimal for INT, fixed 4-decimal otherwise.
fn format_resource(r: f64, parameter_type: ParameterType) -> String {
    match parameter_type {
        ParameterType::Int => (r.trunc() as i64).to_string(),
        _ => format!("{r:.4}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_resource() {
        assert_eq!(format_resource(3.0, ParameterType::Int), "3");
        assert_eq!(format_resource(3.9, ParameterType::Int), "3");
        assert_eq!(format_resource(3.0, ParameterType::Double), "3.0000");
        assert_eq!(format_resource(0.3333, ParameterType::Double), "0.3333");
    }
}
