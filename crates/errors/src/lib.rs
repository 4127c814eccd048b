use thiserror::Error;


#[derive(Debug, Error)]
pub enum TuneError {
    #[error("invalid suggestion configuration: {0}")]
    InvalidConfiguration(String),
    #[error("manager request failed: {0}")]
    Manager(String),
    #[error("cluster request failed: {0}")]
    Cluster(String),
    #[error("precondition failed: {0}")]
    FailedPrecondition(String),
    #[error("no pods are found in job {worker_id}")]
    PodNotFound { worker_id: String },
    #[error("worker not found: {id}")]
    WorkerNotFound { id: String },
    #[error("study not found: {id}")]
    StudyNotFound { id: String },
    #[error("trial not found: {id}")]
    TrialNotFound { id: String },
    #[error("database error: {0}")]
    Database(String),
    #[error("invalid worker state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type TuneResult<T> = Result<T, TuneError>;

/// RPC status class of an error. The suggestion surface reports failures as
/// status codes without depending on a transport crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    InvalidArgument,
    FailedPrecondition,
    NotFound,
    Unavailable,
    Internal,
}

impl TuneError {
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
    pub fn manager_error<S: Into<String>>(msg: S) -> Self {
        Self::Manager(msg.into())
    }
    pub fn cluster_error<S: Into<String>>(msg: S) -> Self {
        Self::Cluster(msg.into())
    }
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }
    pub fn precondition_failed<S: Into<String>>(msg: S) -> Self {
        Self::FailedPrecondition(msg.into())
    }
    pub fn pod_not_found<S: Into<String>>(worker_id: S) -> Self {
        Self::PodNotFound {
            worker_id: worker_id.into(),
        }
    }
    pub fn worker_not_found<S: Into<String>>(id: S) -> Self {
        Self::WorkerNotFound { id: id.into() }
    }
    pub fn study_not_found<S: Into<String>>(id: S) -> Self {
        Self::StudyNotFound { id: id.into() }
    }
    pub fn trial_not_found<S: Into<String>>(id: S) -> Self {
        Self::TrialNotFound { id: id.into() }
    }

    pub fn code(&self) -> StatusCode {
        match self {
            TuneError::InvalidConfiguration(_) => StatusCode::InvalidArgument,
            TuneError::FailedPrecondition(_) => StatusCode::FailedPrecondition,
            TuneError::PodNotFound { .. }
            | TuneError::WorkerNotFound { .. }
            | TuneError::StudyNotFound { .. }
            | TuneError::TrialNotFound { .. } => StatusCode::NotFound,
            TuneError::Manager(_) | TuneError::Cluster(_) => StatusCode::Unavailable,
            TuneError::Database(_)
            | TuneError::InvalidStateTransition { .. }
            | TuneError::Serialization(_)
            | TuneError::Internal(_) => StatusCode::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TuneError::Manager(_)
                | TuneError::Cluster(_)
                | TuneError::Database(_)
                | TuneError::FailedPrecondition(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TuneError::InvalidConfiguration(_)
                | TuneError::InvalidStateTransition { .. }
                | TuneError::Internal(_)
        )
    }
}

impl From<serde_json::Error> for TuneError {
    fn from(err: serde_json::Error) -> Self {
        TuneError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TuneError {
    fn from(err: anyhow::Error) -> Self {
        TuneError::Internal(err.to_string())
    }
}
