//! Worker lifecycle controller.
//!
//! Maps logical workers onto cluster batch Jobs, polls their state,
//! harvests pod logs incrementally into the Database and reaps finished or
//! cancelled workloads.

pub mod config;
pub mod controller;
pub mod manifest;


pub use config::ControllerConfig;
pub use controller::WorkerLifecycleController;
pub use manifest::build_job_manifest;
