//! Job-manifest synthesis for worker spawns.

use std::collections::BTreeMap;

use hypertune_domain::{
    ContainerSpec, ImagePullPolicy, JobManifest, PodSpec, PodTemplateSpec, RestartPolicy,
    VolumeMount, VolumeSpec, WorkerConfig,
};

use crate::config::ControllerConfig;

/// Builds the batch Job for one worker. Controller labels (version tag and
/// worker id) are merged with caller-supplied labels, caller wins on
/// conflict, and the merged set lands on both the job and the pod template.
/// The GPU resource key is emitted only when the config requests GPUs.
pub fn build_job_manifest(
    worker_id: &str,
    conf: &WorkerConfig,
    config: &ControllerConfig,
) -> JobManifest {
    let mut labels = BTreeMap::new();
    labels.insert(config.version_label_key.clone(), config.version.clone());
    labels.insert(config.worker_label_key.clone(), worker_id.to_string());
    for (key, value) in &conf.labels {
        labels.insert(key.clone(), value.clone());
    }

    let mut limits = BTreeMap::new();
    limits.insert("cpu".to_string(), conf.cpu.to_string());
    limits.insert("memory".to_string(), conf.memory.clone());
    if conf.gpu > 0 {
        limits.insert(config.gpu_resource_key.clone(), conf.gpu.to_string());
    }

    let mut volumes = Vec::new();
    let mut volume_mounts = Vec::new();
    if let Some(mount) = &conf.mount {
        if !mount.pvc.is_empty() && !mount.path.is_empty() {
            volumes.push(VolumeSpec {
                name: config.mount_volume_name.clone(),
                pvc_claim: mount.pvc.clone(),
            });
            volume_mounts.push(VolumeMount {
                name: config.mount_volume_name.clone(),
                mount_path: mount.path.clone(),
            });
        }
    }

    JobManifest {
        name: worker_id.to_string(),
        labels: labels.clone(),
        template: PodTemplateSpec {
            labels,
            annotations: conf.annotations.clone(),
            spec: PodSpec {
                scheduler_name: conf.scheduler_name.clone(),
                containers: vec![ContainerSpec {
                    name: worker_id.to_string(),
                    image: conf.image.clone(),
                    command: conf.command.clone(),
                    image_pull_policy: ImagePullPolicy::Always,
                    limits,
                    volume_mounts,
                }],
                restart_policy: RestartPolicy::OnFailure,
                image_pull_secrets: vec![conf.pull_secret.clone()],
                tolerations: conf.tolerations.clone(),
                volumes,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypertune_domain::{MountSpec, Toleration};
    use hypertune_testing_utils::test_worker_config;

    #[test]
    fn test_resource_limits_with_gpu() {
        let mut conf = test_worker_config();
        conf.cpu = 2;
        conf.memory = "4Gi".to_string();
        conf.gpu = 1;
        let manifest = build_job_manifest("w-1", &conf, &ControllerConfig::default());

        let limits = &manifest.template.spec.containers[0].limits;
        assert_eq!(limits.get("cpu").unwrap(), "2");
        assert_eq!(limits.get("memory").unwrap(), "4Gi");
        assert_eq!(limits.get("nvidia.com/gpu").unwrap(), "1");
    }

    #[test]
    fn test_gpu_key_is_omitted_without_gpus() {
        let mut conf = test_worker_config();
        conf.gpu = 0;
        let manifest = build_job_manifest("w-1", &conf, &ControllerConfig::default());
        assert!(!manifest.template.spec.containers[0]
            .limits
            .contains_key("nvidia.com/gpu"));
    }

    #[test]
    fn test_labels_merge_with_caller_precedence() {
        let config = ControllerConfig::default();
        let mut conf = test_worker_config();
        conf.labels
            .insert("team".to_string(), "vision".to_string());
        conf.labels
            .insert(config.version_label_key.clone(), "custom".to_string());
        let manifest = build_job_manifest("w-1", &conf, &config);

        assert_eq!(manifest.labels.get("worker-id").unwrap(), "w-1");
        assert_eq!(manifest.labels.get("team").unwrap(), "vision");
        // Caller wins over the controller's version tag.
        assert_eq!(manifest.labels.get("hypertune-version").unwrap(), "custom");
        // Pod template carries the same labels.
        assert_eq!(manifest.template.labels, manifest.labels);
    }

    #[test]
    fn test_container_and_pod_basics() {
        let conf = test_worker_config();
        let manifest = build_job_manifest("w-1", &conf, &ControllerConfig::default());

        assert_eq!(manifest.name, "w-1");
        let container = &manifest.template.spec.containers[0];
        assert_eq!(container.name, "w-1");
        assert_eq!(container.image, "training:latest");
        assert_eq!(container.image_pull_policy, ImagePullPolicy::Always);
        assert_eq!(
            manifest.template.spec.restart_policy,
            RestartPolicy::OnFailure
        );
        assert_eq!(
            manifest.template.spec.image_pull_secrets,
            vec!["registry-secret".to_string()]
        );
    }

    #[test]
    fn test_pvc_mount() {
        let mut conf = test_worker_config();
        conf.mount = Some(MountSpec {
            pvc: "data-claim".to_string(),
            path: "/data".to_string(),
        });
        let manifest = build_job_manifest("w-1", &conf, &ControllerConfig::default());

        let spec = &manifest.template.spec;
        assert_eq!(spec.volumes.len(), 1);
        assert_eq!(spec.volumes[0].name, "pvc-mount-point");
        assert_eq!(spec.volumes[0].pvc_claim, "data-claim");
        assert_eq!(spec.containers[0].volume_mounts[0].mount_path, "/data");
    }

    #[test]
    fn test_incomplete_mount_is_skipped() {
        let mut conf = test_worker_config();
        conf.mount = Some(MountSpec {
            pvc: "data-claim".to_string(),
            path: String::new(),
        });
        let manifest = build_job_manifest("w-1", &conf, &ControllerConfig::default());
        assert!(manifest.template.spec.volumes.is_empty());
        assert!(manifest.template.spec.containers[0].volume_mounts.is_empty());
    }

    #[test]
    fn test_tolerations_and_annotations_are_forwarded() {
        let mut conf = test_worker_config();
        conf.tolerations.push(Toleration {
            key: "gpu-node".to_string(),
            operator: "Equal".to_string(),
            value: "true".to_string(),
            effect: "NoSchedule".to_string(),
        });
        conf.annotations
            .insert("prometheus.io/scrape".to_string(), "true".to_string());
        let manifest = build_job_manifest("w-1", &conf, &ControllerConfig::default());

        assert_eq!(manifest.template.spec.tolerations, conf.tolerations);
        assert_eq!(
            manifest.template.annotations.get("prometheus.io/scrape").unwrap(),
            "true"
        );
    }
}
