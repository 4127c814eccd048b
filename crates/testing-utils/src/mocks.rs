//! In-memory mock implementations of the port traits.
//!
//! Mocks record every mutating call so tests can assert on interaction
//! order and absence (e.g. "no trials were created on a not-ready tick").

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hypertune_domain::{
    ClusterClient, JobManifest, JobStatus, ManagerClient, MetricsLog, MetricsLogSet,
    PodLogOptions, PodPhase, PodSummary, StudyConfig, SuggestionParameter, Trial, Worker,
    WorkerRepository, WorkerState,
};
use hypertune_errors::{TuneError, TuneResult};

// ============================================================================
// Manager mock
// ============================================================================

/// In-memory Manager. Issues sequential `trial-<n>` ids and counts calls
/// per operation.
#[derive(Clone)]
pub struct MockManagerClient {
    studies: Arc<Mutex<HashMap<String, StudyConfig>>>,
    trials: Arc<Mutex<Vec<Trial>>>,
    workers: Arc<Mutex<HashMap<(String, String), Vec<Worker>>>>,
    metrics: Arc<Mutex<HashMap<String, MetricsLogSet>>>,
    parameters: Arc<Mutex<HashMap<String, Vec<SuggestionParameter>>>>,
    set_parameter_calls: Arc<Mutex<Vec<(String, String, String, Vec<SuggestionParameter>)>>>,
    next_trial_id: Arc<Mutex<i64>>,
    call_counts: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl MockManagerClient {
    pub fn new() -> Self {
        Self {
            studies: Arc::default(),
            trials: Arc::default(),
            workers: Arc::default(),
            metrics: Arc::default(),
            parameters: Arc::default(),
            set_parameter_calls: Arc::default(),
            next_trial_id: Arc::new(Mutex::new(1)),
            call_counts: Arc::default(),
        }
    }

    pub fn with_study(self, study_id: &str, config: StudyConfig) -> Self {
        self.studies
            .lock()
            .unwrap()
            .insert(study_id.to_string(), config);
        self
    }

    pub fn with_parameters(self, param_id: &str, params: Vec<SuggestionParameter>) -> Self {
        self.parameters
            .lock()
            .unwrap()
            .insert(param_id.to_string(), params);
        self
    }

    pub fn add_worker(&self, worker: Worker) {
        self.workers
            .lock()
            .unwrap()
            .entry((worker.study_id.clone(), worker.trial_id.clone()))
            .or_default()
            .push(worker);
    }

    /// Seeds the metric series one worker reports for the objective metric.
    pub fn set_metrics(&self, worker_id: &str, status: WorkerState, name: &str, values: &[&str]) {
        self.metrics.lock().unwrap().insert(
            worker_id.to_string(),
            MetricsLogSet {
                worker_id: worker_id.to_string(),
                worker_status: status,
                metrics_logs: vec![MetricsLog {
                    name: name.to_string(),
                    values: values.iter().map(|v| v.to_string()).collect(),
                }],
            },
        );
    }

    pub fn created_trials(&self) -> Vec<Trial> {
        self.trials.lock().unwrap().clone()
    }

    pub fn created_trial_count(&self) -> usize {
        self.trials.lock().unwrap().len()
    }

    pub fn stored_parameters(&self, param_id: &str) -> Option<Vec<SuggestionParameter>> {
        self.parameters.lock().unwrap().get(param_id).cloned()
    }

    pub fn set_parameter_calls(&self) -> usize {
        self.set_parameter_calls.lock().unwrap().len()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.call_counts
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    fn count(&self, operation: &'static str) {
        *self.call_counts.lock().unwrap().entry(operation).or_insert(0) += 1;
    }
}

impl Default for MockManagerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManagerClient for MockManagerClient {
    async fn get_study(&self, study_id: &str) -> TuneResult<StudyConfig> {
        self.count("get_study");
        self.studies
            .lock()
            .unwrap()
            .get(study_id)
            .cloned()
            .ok_or_else(|| TuneError::study_not_found(study_id))
    }

    async fn create_trial(&self, trial: &Trial) -> TuneResult<String> {
        self.count("create_trial");
        let mut next = self.next_trial_id.lock().unwrap();
        let trial_id = format!("trial-{}", *next);
        *next += 1;
        let mut created = trial.clone();
        created.trial_id = trial_id.clone();
        self.trials.lock().unwrap().push(created);
        Ok(trial_id)
    }

    async fn get_trials(&self, study_id: &str) -> TuneResult<Vec<Trial>> {
        self.count("get_trials");
        Ok(self
            .trials
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.study_id == study_id)
            .cloned()
            .collect())
    }

    async fn get_workers(&self, study_id: &str, trial_id: &str) -> TuneResult<Vec<Worker>> {
        self.count("get_workers");
        Ok(self
            .workers
            .lock()
            .unwrap()
            .get(&(study_id.to_string(), trial_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_metrics(
        &self,
        _study_id: &str,
        worker_ids: &[String],
        _metrics_names: &[String],
    ) -> TuneResult<Vec<MetricsLogSet>> {
        self.count("get_metrics");
        let metrics = self.metrics.lock().unwrap();
        Ok(worker_ids
            .iter()
            .filter_map(|id| metrics.get(id).cloned())
            .collect())
    }

    async fn get_suggestion_parameters(
        &self,
        param_id: &str,
    ) -> TuneResult<Vec<SuggestionParameter>> {
        self.count("get_suggestion_parameters");
        Ok(self
            .parameters
            .lock()
            .unwrap()
            .get(param_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_suggestion_parameters(
        &self,
        study_id: &str,
        suggestion_algorithm: &str,
        param_id: &str,
        params: Vec<SuggestionParameter>,
    ) -> TuneResult<()> {
        self.count("set_suggestion_parameters");
        self.parameters
            .lock()
            .unwrap()
            .insert(param_id.to_string(), params.clone());
        self.set_parameter_calls.lock().unwrap().push((
            study_id.to_string(),
            suggestion_algorithm.to_string(),
            param_id.to_string(),
            params,
        ));
        Ok(())
    }
}

// ============================================================================
// Database mock
// ============================================================================

/// In-memory worker rows and log store. Log lines are deduped by their
/// timestamp prefix and the per-worker high-water mark advances, matching
/// the contract expected of the real Database.
#[derive(Clone, Default)]
pub struct MockWorkerRepository {
    workers: Arc<Mutex<HashMap<String, Worker>>>,
    logs: Arc<Mutex<HashMap<String, Vec<String>>>>,
    timestamps: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    update_calls: Arc<Mutex<Vec<(String, WorkerState)>>>,
    fail_updates: Arc<Mutex<bool>>,
}

impl MockWorkerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: Vec<Worker>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.workers.lock().unwrap();
            for w in workers {
                map.insert(w.worker_id.clone(), w);
            }
        }
        repo
    }

    pub fn worker(&self, worker_id: &str) -> Option<Worker> {
        self.workers.lock().unwrap().get(worker_id).cloned()
    }

    pub fn stored_logs(&self, worker_id: &str) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .get(worker_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_timestamp(&self, worker_id: &str, ts: DateTime<Utc>) {
        self.timestamps
            .lock()
            .unwrap()
            .insert(worker_id.to_string(), ts);
    }

    pub fn update_calls(&self) -> Vec<(String, WorkerState)> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().unwrap() = fail;
    }
}

#[async_trait]
impl WorkerRepository for MockWorkerRepository {
    async fn get_worker_list(
        &self,
        study_id: &str,
        trial_id: Option<&str>,
    ) -> TuneResult<Vec<Worker>> {
        let mut list: Vec<Worker> = self
            .workers
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.study_id == study_id)
            .filter(|w| trial_id.map_or(true, |t| w.trial_id == t))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
        Ok(list)
    }

    async fn update_worker(&self, worker_id: &str, state: WorkerState) -> TuneResult<()> {
        if *self.fail_updates.lock().unwrap() {
            return Err(TuneError::database_error("update_worker failed"));
        }
        self.update_calls
            .lock()
            .unwrap()
            .push((worker_id.to_string(), state));
        let mut workers = self.workers.lock().unwrap();
        let worker = workers
            .get_mut(worker_id)
            .ok_or_else(|| TuneError::worker_not_found(worker_id))?;
        worker.status = state;
        Ok(())
    }

    async fn get_worker_timestamp(&self, worker_id: &str) -> TuneResult<Option<DateTime<Utc>>> {
        Ok(self.timestamps.lock().unwrap().get(worker_id).copied())
    }

    async fn store_worker_logs(&self, worker_id: &str, lines: Vec<String>) -> TuneResult<()> {
        let mut timestamps = self.timestamps.lock().unwrap();
        let mut logs = self.logs.lock().unwrap();
        let high_water = timestamps.get(worker_id).copied();
        let stored = logs.entry(worker_id.to_string()).or_default();
        let mut mark = high_water;
        for line in lines {
            let ts = line
                .split_whitespace()
                .next()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc));
            if let (Some(ts), Some(mark)) = (ts, high_water) {
                if ts <= mark {
                    continue;
                }
            }
            if let Some(ts) = ts {
                mark = Some(mark.map_or(ts, |m| m.max(ts)));
            }
            stored.push(line);
        }
        if let Some(mark) = mark {
            timestamps.insert(worker_id.to_string(), mark);
        }
        Ok(())
    }
}

// ============================================================================
// Cluster mock
// ============================================================================

/// In-memory cluster orchestrator. Pods are scripted per job by the test;
/// deletions are recorded and can be made to fail to exercise best-effort
/// teardown.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    jobs: Arc<Mutex<HashMap<String, JobManifest>>>,
    job_status: Arc<Mutex<HashMap<String, JobStatus>>>,
    pods: Arc<Mutex<HashMap<String, Vec<PodSummary>>>>,
    pod_logs: Arc<Mutex<HashMap<String, String>>>,
    log_requests: Arc<Mutex<Vec<(String, PodLogOptions)>>>,
    deleted_jobs: Arc<Mutex<Vec<String>>>,
    deleted_pods: Arc<Mutex<Vec<String>>>,
    fail_deletes: Arc<Mutex<bool>>,
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted_job(&self, name: &str) -> Option<JobManifest> {
        self.jobs.lock().unwrap().get(name).cloned()
    }

    pub fn set_job_succeeded(&self, name: &str, succeeded: i32) {
        self.job_status
            .lock()
            .unwrap()
            .insert(name.to_string(), JobStatus { succeeded });
    }

    pub fn add_pod(&self, job_name: &str, pod_name: &str, phase: PodPhase) {
        self.pods
            .lock()
            .unwrap()
            .entry(job_name.to_string())
            .or_default()
            .push(PodSummary {
                name: pod_name.to_string(),
                phase,
            });
    }

    pub fn set_pod_logs(&self, pod_name: &str, payload: &str) {
        self.pod_logs
            .lock()
            .unwrap()
            .insert(pod_name.to_string(), payload.to_string());
    }

    pub fn log_requests(&self) -> Vec<(String, PodLogOptions)> {
        self.log_requests.lock().unwrap().clone()
    }

    pub fn deleted_jobs(&self) -> Vec<String> {
        self.deleted_jobs.lock().unwrap().clone()
    }

    pub fn deleted_pods(&self) -> Vec<String> {
        self.deleted_pods.lock().unwrap().clone()
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock().unwrap() = fail;
    }
}

#[async_trait]
impl ClusterClient for MockClusterClient {
    async fn create_job(&self, _namespace: &str, manifest: &JobManifest) -> TuneResult<()> {
        self.jobs
            .lock()
            .unwrap()
            .insert(manifest.name.clone(), manifest.clone());
        self.job_status
            .lock()
            .unwrap()
            .entry(manifest.name.clone())
            .or_insert(JobStatus { succeeded: 0 });
        Ok(())
    }

    async fn get_job(&self, _namespace: &str, name: &str) -> TuneResult<JobStatus> {
        self.job_status
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .ok_or_else(|| TuneError::cluster_error(format!("job {name} not found")))
    }

    async fn delete_job(&self, _namespace: &str, name: &str) -> TuneResult<()> {
        if *self.fail_deletes.lock().unwrap() {
            return Err(TuneError::cluster_error("delete_job failed"));
        }
        self.deleted_jobs.lock().unwrap().push(name.to_string());
        self.jobs.lock().unwrap().remove(name);
        self.job_status.lock().unwrap().remove(name);
        Ok(())
    }

    async fn list_pods(
        &self,
        _namespace: &str,
        label_selector: &str,
    ) -> TuneResult<Vec<PodSummary>> {
        let job_name = label_selector
            .strip_prefix("job-name=")
            .unwrap_or(label_selector);
        Ok(self
            .pods
            .lock()
            .unwrap()
            .get(job_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_pod(&self, _namespace: &str, name: &str) -> TuneResult<()> {
        if *self.fail_deletes.lock().unwrap() {
            return Err(TuneError::cluster_error("delete_pod failed"));
        }
        self.deleted_pods.lock().unwrap().push(name.to_string());
        let mut pods = self.pods.lock().unwrap();
        for list in pods.values_mut() {
            list.retain(|p| p.name != name);
        }
        Ok(())
    }

    async fn pod_logs(
        &self,
        _namespace: &str,
        pod_name: &str,
        options: &PodLogOptions,
    ) -> TuneResult<String> {
        self.log_requests
            .lock()
            .unwrap()
            .push((pod_name.to_string(), options.clone()));
        Ok(self
            .pod_logs
            .lock()
            .unwrap()
            .get(pod_name)
            .cloned()
            .unwrap_or_default())
    }
}
