//! `slo-core`, the job status domain: validation, field catalog and query predicates.
//!
//! This crate is **pure domain** (no storage or transport concerns). Everything
//! that can fail returns an [`ErrorRecord`] tagged with an [`ErrorCode`].

pub mod date;
pub mod entity;
pub mod error;
pub mod field;
pub mod job_status;
pub mod query;

pub use date::BusinessDate;
pub use entity::Entity;
pub use error::{ErrorCode, ErrorRecord, SloResult};
pub use field::{FieldKind, JobStatusField};
pub use job_status::{JobStatus, JobStatusCode, JobStatusDto, JobStatusKey};
pub use query::{QueryPredicate, QueryTerm, QueryValue, SqlFilter, translate};
