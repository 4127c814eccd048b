//! Core entities: studies, trials, workers and their spawn configuration.

use std::collections::BTreeMap;

use hypertune_errors::{TuneError, TuneResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// Study and parameter space
// ============================================================================

/// Type of a tunable parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParameterType {
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "CATEGORICAL")]
    Categorical,
}

/// Feasible region of a parameter. `min`/`max` bound numeric types, `list`
/// enumerates categorical choices. Values stay as strings on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeasibleSpace {
    #[serde(default)]
    pub min: String,
    #[serde(default)]
    pub max: String,
    #[serde(default)]
    pub list: Vec<String>,
}

/// Declared configuration of one tunable parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    pub parameter_type: ParameterType,
    pub feasible: FeasibleSpace,
}

/// Direction of the study objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptimizationType {
    #[serde(rename = "MINIMIZE")]
    Minimize,
    #[serde(rename = "MAXIMIZE")]
    Maximize,
}

/// Study definition as returned by the Manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    pub name: String,
    pub objective_value_name: String,
    pub optimization_type: OptimizationType,
    pub parameter_configs: Vec<ParameterConfig>,
}

impl StudyConfig {
    pub fn parameter_config(&self, name: &str) -> Option<&ParameterConfig> {
        self.parameter_configs.iter().find(|pc| pc.name == name)
    }
}

// ============================================================================
// Trials
// ============================================================================

/// A concrete name/value assignment within a trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub parameter_type: ParameterType,
    pub value: String,
}

/// One immutable parameter assignment for a study. The `trial_id` is issued
/// by the Manager on registration and is empty before that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub trial_id: String,
    pub study_id: String,
    pub parameter_set: Vec<Parameter>,
}

impl Trial {
    pub fn new(study_id: impl Into<String>) -> Self {
        Self {
            trial_id: String::new(),
            study_id: study_id.into(),
            parameter_set: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameter_set.iter().find(|p| p.name == name)
    }
}

// ============================================================================
// Workers
// ============================================================================

/// Lifecycle state of a worker. Strict forward progress:
/// Pending -> Running -> (Completed | Killed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkerState {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "KILLED")]
    Killed,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Pending => "PENDING",
            WorkerState::Running => "RUNNING",
            WorkerState::Completed => "COMPLETED",
            WorkerState::Killed => "KILLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Completed | WorkerState::Killed)
    }

    /// Whether the lifecycle allows moving to `next`. Terminal states accept
    /// nothing; Pending must pass through Running.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (WorkerState::Pending, WorkerState::Running)
                | (WorkerState::Running, WorkerState::Completed)
                | (WorkerState::Running, WorkerState::Killed)
        )
    }
}

/// A runtime execution of a trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub worker_id: String,
    pub study_id: String,
    pub trial_id: String,
    pub status: WorkerState,
}

impl Worker {
    pub fn is_running(&self) -> bool {
        self.status == WorkerState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status == WorkerState::Completed
    }

    /// Apply a lifecycle transition, rejecting backward or skipping moves.
    pub fn transition_to(&mut self, next: WorkerState) -> TuneResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(TuneError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

// ============================================================================
// Worker spawn configuration
// ============================================================================

/// Persistent-volume mount for a worker container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountSpec {
    pub pvc: String,
    pub path: String,
}

/// Scheduling toleration forwarded to the pod template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Toleration {
    pub key: String,
    pub operator: String,
    pub value: String,
    pub effect: String,
}

/// Immutable spawn spec of a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub image: String,
    pub command: Vec<String>,
    #[serde(default)]
    pub pull_secret: String,
    #[serde(default)]
    pub scheduler_name: String,
    pub cpu: i64,
    pub memory: String,
    #[serde(default)]
    pub gpu: i64,
    #[serde(default)]
    pub mount: Option<MountSpec>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

// ============================================================================
// Metrics and opaque suggestion parameters
// ============================================================================

/// One named metric series reported by a worker, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsLog {
    pub name: String,
    pub values: Vec<String>,
}

/// Metric series of one worker plus the worker status at collection time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsLogSet {
    pub worker_id: String,
    pub worker_status: WorkerState,
    pub metrics_logs: Vec<MetricsLog>,
}

/// Opaque name/value entry of the Manager's suggestion-parameter store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionParameter {
    pub name: String,
    pub value: String,
}

impl SuggestionParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
