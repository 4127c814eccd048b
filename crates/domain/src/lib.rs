//! Domain model for the hypertune control plane.
//!
//! Entities describe studies, trials and workers; the cluster module carries
//! the orchestrator-facing manifest types; ports define the abstract
//! interfaces to the Manager service, the worker Database and the cluster
//! orchestrator.

pub mod cluster;
pub mod entities;
pub mod ports;

pub use cluster::*;
pub use entities::*;
pub use hypertune_errors::{StatusCode, TuneError, TuneResult};
pub use ports::*;
