//! The Hyperband controller: one successive-halving step per call.

use std::sync::Arc;

use async_trait::async_trait;
use hypertune_domain::{
    GetSuggestionsReply, GetSuggestionsRequest, ManagerClient, SuggestionService, Trial,
};
use hypertune_errors::{TuneError, TuneResult};
use tracing::info;

use crate::bracket::BracketGenerator;
use crate::codec;
use crate::evaluator::BracketEvaluator;
use crate::random::RandomSampler;
use crate::state::HyperbandState;

/// Hyperband suggestion engine.
///
/// State per `(study_id, param_id)` lives in the Manager's opaque
/// suggestion-parameter store; each `get_suggestions` call loads it, emits
/// one round of trials and persists the advanced state. Concurrent calls
/// for the same key are not serialized here; callers that reconcile the
/// same study from several places must layer their own mutual exclusion.
///
/// Trials are registered with the Manager before the state write, so a
/// failure between the two leaves orphaned trials that the next successful
/// call will not track.
pub struct HyperbandSuggestion {
    manager: Arc<dyn ManagerClient>,
    evaluator: BracketEvaluator,
    generator: BracketGenerator,
}

impl HyperbandSuggestion {
    pub fn new(manager: Arc<dyn ManagerClient>) -> Self {
        Self::with_sampler(manager, RandomSampler::new())
    }

    /// Injects a seeded sampler for deterministic bracket generation.
    pub fn with_sampler(manager: Arc<dyn ManagerClient>, sampler: RandomSampler) -> Self {
        Self {
            evaluator: BracketEvaluator::new(manager.clone()),
            generator: BracketGenerator::new(manager.clone(), sampler),
            manager,
        }
    }

    /// Emits the next generation: a master bracket on a fresh inner loop,
    /// otherwise a child bracket promoted from the ranked previous round.
    /// `Ok(None)` means the previous round is still running.
    async fn make_bracket(
        &self,
        study_id: &str,
        n: i32,
        r: f64,
        state: &HyperbandState,
    ) -> TuneResult<Option<(Vec<String>, Vec<Trial>)>> {
        if state.evaluating_trials.is_empty() || state.shloopitr == 0 {
            return Ok(Some(self.generator.master(study_id, n, r, state).await?));
        }
        match self.evaluator.evaluate(study_id, state).await? {
            None => Ok(None),
            Some(parent) => Ok(Some(
                self.generator.child(&parent, study_id, n, r, state).await?,
            )),
        }
    }
}

#[async_trait]
impl SuggestionService for HyperbandSuggestion {
    async fn get_suggestions(
        &self,
        request: GetSuggestionsRequest,
    ) -> TuneResult<GetSuggestionsReply> {
        let params = self
            .manager
            .get_suggestion_parameters(&request.param_id)
            .await?;
        let mut raw = codec::decode(&params)?;
        if raw.objective_value_name.is_empty() {
            let study = self.manager.get_study(&request.study_id).await?;
            raw.objective_value_name = study.objective_value_name;
        }
        let mut state = raw.resolve()?;

        if state.is_finished() {
            info!("hyperband schedule for study {} is exhausted", request.study_id);
            return Ok(GetSuggestionsReply::default());
        }
        if state.needs_outer_rollover() {
            state.advance_outer_loop();
        }
        let (n_i, r_i) = state.round_parameters();

        let Some((trial_ids, trials)) = self
            .make_bracket(&request.study_id, n_i, r_i, &state)
            .await?
        else {
            return Err(TuneError::precondition_failed(
                "Previous workers are not completed.",
            ));
        };

        state.evaluating_trials = trial_ids;
        state.advance_inner_loop();
        self.manager
            .set_suggestion_parameters(
                &request.study_id,
                &request.suggestion_algorithm,
                &request.param_id,
                codec::encode(&state),
            )
            .await?;
        Ok(GetSuggestionsReply { trials })
    }
}
