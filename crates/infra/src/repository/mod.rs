//! Job status storage boundary and its backends.
//!
//! All backends share the [`JobStatusRepo`] contract and report failures
//! through the classifier in [`classify`], so callers see the same error codes
//! whichever one is configured.

pub mod classify;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

#[cfg(feature = "orm")]
pub mod orm;
#[cfg(feature = "orm")]
mod schema;

pub use classify::{classify, storage_error, StorageFault};
pub use in_memory::{InMemoryError, InMemoryJobStatusRepo};
#[cfg(feature = "orm")]
pub use orm::OrmJobStatusRepo;
pub use postgres::PostgresJobStatusRepo;
pub use r#trait::JobStatusRepo;
