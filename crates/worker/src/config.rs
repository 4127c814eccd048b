//! Controller configuration.

use serde::{Deserialize, Serialize};

/// Cluster-facing defaults, injected at construction time so deployments
/// can override the namespace and label scheme per installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Namespace all jobs and pods live in.
    pub namespace: String,
    /// Label key carrying the controller version tag.
    pub version_label_key: String,
    /// Version tag value stamped on every job and pod.
    pub version: String,
    /// Label key carrying the worker id.
    pub worker_label_key: String,
    /// Resource-limit key used when a worker requests GPUs.
    pub gpu_resource_key: String,
    /// Volume name used for persistent-volume-claim mounts.
    pub mount_volume_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: "hypertune".to_string(),
            version_label_key: "hypertune-version".to_string(),
            version: "alpha-0.2.0".to_string(),
            worker_label_key: "worker-id".to_string(),
            gpu_resource_key: "nvidia.com/gpu".to_string(),
            mount_volume_name: "pvc-mount-point".to_string(),
        }
    }
}
