//! The reconciliation operations over workers, jobs and pods.

use std::sync::Arc;

use hypertune_domain::{
    ClusterClient, PodLogOptions, PodPhase, PodSummary, Worker, WorkerConfig, WorkerRepository,
    WorkerState,
};
use hypertune_errors::{TuneError, TuneResult};
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::manifest::build_job_manifest;

/// Translates logical workers into cluster Jobs and reconciles their state.
///
/// A worker's Job is expected to run a single pod; the first listed pod is
/// authoritative for phase checks, log harvesting and teardown. Database
/// errors abort the running operation; cluster deletions are best-effort.
pub struct WorkerLifecycleController {
    cluster: Arc<dyn ClusterClient>,
    database: Arc<dyn WorkerRepository>,
    config: ControllerConfig,
}

impl WorkerLifecycleController {
    pub fn new(cluster: Arc<dyn ClusterClient>, database: Arc<dyn WorkerRepository>) -> Self {
        Self::with_config(cluster, database, ControllerConfig::default())
    }

    pub fn with_config(
        cluster: Arc<dyn ClusterClient>,
        database: Arc<dyn WorkerRepository>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            cluster,
            database,
            config,
        }
    }

    /// Submits the Job for a worker. Submission is the only cluster-side
    /// effect; failures surface to the caller.
    pub async fn spawn_worker(&self, worker_id: &str, conf: &WorkerConfig) -> TuneResult<()> {
        let manifest = build_job_manifest(worker_id, conf, &self.config);
        self.cluster
            .create_job(&self.config.namespace, &manifest)
            .await?;
        info!("created job {worker_id}");
        Ok(())
    }

    /// A worker is complete once its Job reports a success and its pod has
    /// reached the Succeeded phase. A missing pod under a succeeded Job is
    /// a hard error.
    pub async fn is_worker_complete(&self, worker_id: &str) -> TuneResult<bool> {
        let status = self
            .cluster
            .get_job(&self.config.namespace, worker_id)
            .await?;
        if status.succeeded == 0 {
            return Ok(false);
        }
        let pods = self.list_job_pods(worker_id).await?;
        let pod = pods
            .first()
            .ok_or_else(|| TuneError::pod_not_found(worker_id))?;
        Ok(pod.phase == PodPhase::Succeeded)
    }

    /// Harvests new log lines of the worker's pod into the Database. The
    /// fetch is bounded by the stored high-water timestamp so only unseen
    /// lines travel; an empty response is a no-op.
    pub async fn store_worker_log(&self, worker_id: &str) -> TuneResult<()> {
        let pods = self.list_job_pods(worker_id).await?;
        let pod = pods
            .first()
            .ok_or_else(|| TuneError::pod_not_found(worker_id))?;
        let since_time = self.database.get_worker_timestamp(worker_id).await?;
        let options = PodLogOptions {
            timestamps: true,
            since_time,
        };
        let logs = self
            .cluster
            .pod_logs(&self.config.namespace, &pod.name, &options)
            .await?;
        if logs.is_empty() {
            return Ok(());
        }
        let lines: Vec<String> = logs.lines().map(str::to_string).collect();
        self.database.store_worker_logs(worker_id, lines).await
    }

    /// Reconciles every worker of a study one step forward:
    /// Pending workers move to Running once their pod yields logs, Running
    /// workers are checked for completion (tail logs captured either way)
    /// and reaped once complete. Terminal workers are left alone.
    pub async fn update_worker_status(&self, study_id: &str) -> TuneResult<()> {
        let workers = self.database.get_worker_list(study_id, None).await?;
        for worker in workers {
            match worker.status {
                WorkerState::Pending => {
                    match self.store_worker_log(&worker.worker_id).await {
                        Ok(()) => self.transition(worker, WorkerState::Running).await?,
                        Err(err) => {
                            debug!(
                                "worker {} has produced no output yet: {err}",
                                worker.worker_id
                            );
                        }
                    }
                }
                WorkerState::Running => {
                    let worker_id = worker.worker_id.clone();
                    let complete = self.is_worker_complete(&worker_id).await?;
                    self.store_worker_log(&worker_id).await?;
                    if complete {
                        self.transition(worker, WorkerState::Completed).await?;
                        self.reap(&worker_id).await;
                    }
                }
                WorkerState::Completed | WorkerState::Killed => {}
            }
        }
        Ok(())
    }

    /// Tears down every Running worker of a study and marks it Killed.
    pub async fn clean_workers(&self, study_id: &str) -> TuneResult<()> {
        let workers = self.database.get_worker_list(study_id, None).await?;
        for worker in workers {
            if worker.status == WorkerState::Running {
                self.reap(&worker.worker_id).await;
                self.transition(worker, WorkerState::Killed).await?;
            }
        }
        Ok(())
    }

    /// Tears down the Running workers named in `worker_ids`, marking each
    /// Completed when `is_complete` is set and Killed otherwise.
    pub async fn stop_workers(
        &self,
        study_id: &str,
        worker_ids: &[String],
        is_complete: bool,
    ) -> TuneResult<()> {
        let target = if is_complete {
            WorkerState::Completed
        } else {
            WorkerState::Killed
        };
        let workers = self.database.get_worker_list(study_id, None).await?;
        for worker in workers {
            if worker.status == WorkerState::Running && worker_ids.contains(&worker.worker_id) {
                self.reap(&worker.worker_id).await;
                self.transition(worker, target).await?;
            }
        }
        Ok(())
    }

    /// Applies a lifecycle transition to the Database. The entity predicate
    /// rejects backward or skipping moves before anything is written.
    async fn transition(&self, mut worker: Worker, next: WorkerState) -> TuneResult<()> {
        worker.transition_to(next)?;
        self.database.update_worker(&worker.worker_id, next).await
    }

    async fn list_job_pods(&self, worker_id: &str) -> TuneResult<Vec<PodSummary>> {
        self.cluster
            .list_pods(&self.config.namespace, &format!("job-name={worker_id}"))
            .await
    }

    /// Best-effort teardown of a worker's Job and pod. The recorded worker
    /// state is authoritative, so failures here are logged and swallowed.
    async fn reap(&self, worker_id: &str) {
        if let Err(err) = self
            .cluster
            .delete_job(&self.config.namespace, worker_id)
            .await
        {
            warn!("failed to delete job {worker_id}: {err}");
        }
        match self.list_job_pods(worker_id).await {
            Ok(pods) => {
                if let Some(pod) = pods.first() {
                    if let Err(err) = self
                        .cluster
                        .delete_pod(&self.config.namespace, &pod.name)
                        .await
                    {
                        warn!("failed to delete pod {}: {err}", pod.name);
                    }
                }
            }
            Err(err) => warn!("failed to list pods of job {worker_id}: {err}"),
        }
    }
}
