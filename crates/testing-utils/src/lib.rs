//! Shared testing utilities for the hypertune workspace.
//!
//! Provides in-memory mock implementations of the Manager, Database and
//! cluster ports plus test-data builders, so unit tests run without any
//! external service.
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! hypertune-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
