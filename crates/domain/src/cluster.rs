//! Orchestrator-facing manifest and status types.
//!
//! The cluster is consumed behind the [`crate::ports::ClusterClient`] port,
//! so these are plain domain structs shaped like the batch Job / Pod objects
//! the orchestrator actually receives.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Toleration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImagePullPolicy {
    Always,
    IfNotPresent,
    Never,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RestartPolicy {
    Always,
    OnFailure,
    Never,
}

/// Observed phase of a pod.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

/// Volume definition. Only persistent-volume-claim sources are used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeSpec {
    pub name: String,
    pub pvc_claim: String,
}

/// Single container of a worker pod. `limits` maps resource keys to quantity
/// strings, e.g. `cpu -> "2"`, `memory -> "4Gi"`, `nvidia.com/gpu -> "1"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub image_pull_policy: ImagePullPolicy,
    pub limits: BTreeMap<String, String>,
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodSpec {
    pub scheduler_name: String,
    pub containers: Vec<ContainerSpec>,
    pub restart_policy: RestartPolicy,
    pub image_pull_secrets: Vec<String>,
    pub tolerations: Vec<Toleration>,
    pub volumes: Vec<VolumeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub spec: PodSpec,
}

/// Batch Job manifest submitted for one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobManifest {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub template: PodTemplateSpec,
}

/// Status subset of a batch Job. `succeeded` counts finished pods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct JobStatus {
    pub succeeded: i32,
}

/// Name and phase of a listed pod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodSummary {
    pub name: String,
    pub phase: PodPhase,
}

/// Options for a pod log request. `since_time` bounds the fetch to lines
/// after the high-water timestamp; `timestamps` prefixes each line with its
/// emission time so the Database can dedupe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodLogOptions {
    pub timestamps: bool,
    pub since_time: Option<DateTime<Utc>>,
}
