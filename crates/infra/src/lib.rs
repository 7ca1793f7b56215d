//! Infrastructure layer: storage backends, config, use cases.

pub mod config;
pub mod repository;
pub mod use_cases;

#[cfg(test)]
mod integration_tests;

pub use config::{build_repo, StorageBackend, StorageConfig};
pub use repository::{InMemoryJobStatusRepo, JobStatusRepo, PostgresJobStatusRepo};
pub use use_cases::JobStatusUseCases;
