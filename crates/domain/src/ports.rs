//! Port traits for the external collaborators.
//!
//! All operations are synchronous request/response; every call may block on
//! the network and callers drive their own cadence. Dropping an in-flight
//! future cancels the call; effects already applied on the remote side
//! (e.g. registered trials) stay behind until the next reconciliation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hypertune_errors::TuneResult;
use serde::{Deserialize, Serialize};

use crate::cluster::{JobManifest, JobStatus, PodLogOptions, PodSummary};
use crate::entities::{
    MetricsLogSet, StudyConfig, SuggestionParameter, Trial, Worker, WorkerState,
};

/// Client of the Manager service: study lookups, trial registration, worker
/// and metric queries, and the opaque suggestion-parameter store.
#[async_trait]
pub trait ManagerClient: Send + Sync {
    async fn get_study(&self, study_id: &str) -> TuneResult<StudyConfig>;
    /// Registers a trial and returns the Manager-issued trial id.
    async fn create_trial(&self, trial: &Trial) -> TuneResult<String>;
    async fn get_trials(&self, study_id: &str) -> TuneResult<Vec<Trial>>;
    async fn get_workers(&self, study_id: &str, trial_id: &str) -> TuneResult<Vec<Worker>>;
    async fn get_metrics(
        &self,
        study_id: &str,
        worker_ids: &[String],
        metrics_names: &[String],
    ) -> TuneResult<Vec<MetricsLogSet>>;
    async fn get_suggestion_parameters(
        &self,
        param_id: &str,
    ) -> TuneResult<Vec<SuggestionParameter>>;
    async fn set_suggestion_parameters(
        &self,
        study_id: &str,
        suggestion_algorithm: &str,
        param_id: &str,
        params: Vec<SuggestionParameter>,
    ) -> TuneResult<()>;
}

/// Worker rows and log storage. The implementation is expected to dedupe
/// stored log lines by their timestamp prefix and advance the per-worker
/// high-water mark returned by `get_worker_timestamp`.
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    async fn get_worker_list(
        &self,
        study_id: &str,
        trial_id: Option<&str>,
    ) -> TuneResult<Vec<Worker>>;
    async fn update_worker(&self, worker_id: &str, state: WorkerState) -> TuneResult<()>;
    async fn get_worker_timestamp(&self, worker_id: &str) -> TuneResult<Option<DateTime<Utc>>>;
    async fn store_worker_logs(&self, worker_id: &str, lines: Vec<String>) -> TuneResult<()>;
}

/// Abstract cluster orchestrator: batch Jobs, pods and pod logs.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn create_job(&self, namespace: &str, manifest: &JobManifest) -> TuneResult<()>;
    async fn get_job(&self, namespace: &str, name: &str) -> TuneResult<JobStatus>;
    async fn delete_job(&self, namespace: &str, name: &str) -> TuneResult<()>;
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> TuneResult<Vec<PodSummary>>;
    async fn delete_pod(&self, namespace: &str, name: &str) -> TuneResult<()>;
    async fn pod_logs(
        &self,
        namespace: &str,
        pod_name: &str,
        options: &PodLogOptions,
    ) -> TuneResult<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSuggestionsRequest {
    pub study_id: String,
    pub suggestion_algorithm: String,
    pub param_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetSuggestionsReply {
    pub trials: Vec<Trial>,
}

/// The exposed suggestion surface. Errors carry an RPC status class via
/// [`hypertune_errors::TuneError::code`]; a `FailedPrecondition` means prior
/// trials are still running and no new trials were created.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn get_suggestions(
        &self,
        request: GetSuggestionsRequest,
    ) -> TuneResult<GetSuggestionsReply>;
}
