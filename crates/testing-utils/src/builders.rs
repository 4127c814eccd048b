//! Test-data builders with sensible defaults and easy customization.

use std::collections::BTreeMap;

use hypertune_domain::{
    FeasibleSpace, OptimizationType, ParameterConfig, ParameterType, StudyConfig, Worker,
    WorkerConfig, WorkerState,
};
use uuid::Uuid;

/// Builder for test [`StudyConfig`] entities.
pub struct StudyConfigBuilder {
    config: StudyConfig,
}

impl StudyConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: StudyConfig {
                name: "test_study".to_string(),
                objective_value_name: "accuracy".to_string(),
                optimization_type: OptimizationType::Maximize,
                parameter_configs: Vec::new(),
            },
        }
    }

    pub fn with_objective(mut self, name: &str) -> Self {
        self.config.objective_value_name = name.to_string();
        self
    }

    pub fn minimize(mut self) -> Self {
        self.config.optimization_type = OptimizationType::Minimize;
        self
    }

    pub fn with_int_param(mut self, name: &str, min: &str, max: &str) -> Self {
        self.config.parameter_configs.push(ParameterConfig {
            name: name.to_string(),
            parameter_type: ParameterType::Int,
            feasible: FeasibleSpace {
                min: min.to_string(),
                max: max.to_string(),
                list: vec![],
            },
        });
        self
    }

    pub fn with_double_param(mut self, name: &str, min: &str, max: &str) -> Self {
        self.config.parameter_configs.push(ParameterConfig {
            name: name.to_string(),
            parameter_type: ParameterType::Double,
            feasible: FeasibleSpace {
                min: min.to_string(),
                max: max.to_string(),
                list: vec![],
            },
        });
        self
    }

    pub fn with_categorical_param(mut self, name: &str, choices: &[&str]) -> Self {
        self.config.parameter_configs.push(ParameterConfig {
            name: name.to_string(),
            parameter_type: ParameterType::Categorical,
            feasible: FeasibleSpace {
                min: String::new(),
                max: String::new(),
                list: choices.iter().map(|c| c.to_string()).collect(),
            },
        });
        self
    }

    pub fn build(self) -> StudyConfig {
        self.config
    }
}

impl Default for StudyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a test worker in the given state.
pub fn test_worker(worker_id: &str, study_id: &str, trial_id: &str, status: WorkerState) -> Worker {
    Worker {
        worker_id: worker_id.to_string(),
        study_id: study_id.to_string(),
        trial_id: trial_id.to_string(),
        status,
    }
}

/// Creates a minimal spawn spec; callers override fields as needed.
pub fn test_worker_config() -> WorkerConfig {
    WorkerConfig {
        image: "training:latest".to_string(),
        command: vec!["python".to_string(), "train.py".to_string()],
        pull_secret: "registry-secret".to_string(),
        scheduler_name: String::new(),
        cpu: 1,
        memory: "1Gi".to_string(),
        gpu: 0,
        mount: None,
        tolerations: vec![],
        labels: BTreeMap::new(),
        annotations: BTreeMap::new(),
    }
}

/// A unique worker id for tests that spawn several workers.
pub fn unique_worker_id() -> String {
    format!("worker-{}", Uuid::new_v4())
}
