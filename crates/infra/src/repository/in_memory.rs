use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

use slo_core::{Entity, JobStatus, QueryPredicate, SloResult};

use super::classify::storage_error;
use super::r#trait::JobStatusRepo;

/// Failures the in-memory store can produce.
#[derive(Debug, Error)]
pub enum InMemoryError {
    #[error("duplicate key {0}")]
    DuplicateKey(String),

    #[error("lock poisoned")]
    Poisoned,
}

/// Process-local job status store.
///
/// A single mutex serializes every operation, so this backend is
/// linearizable. Queries are a linear scan in insertion order.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryJobStatusRepo {
    rows: Mutex<Vec<JobStatus>>,
}

impl InMemoryJobStatusRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing rows. Duplicate keys are not checked here.
    pub fn with_rows(rows: Vec<JobStatus>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn lock(&self, operation: &str) -> SloResult<MutexGuard<'_, Vec<JobStatus>>> {
        self.rows
            .lock()
            .map_err(|_| storage_error(operation, InMemoryError::Poisoned))
    }
}

#[async_trait]
impl JobStatusRepo for InMemoryJobStatusRepo {
    async fn add(&self, job_status: &JobStatus) -> SloResult<()> {
        let mut rows = self.lock("insert job status")?;

        let key = job_status.id();
        if rows.iter().any(|row| row.id() == key) {
            let err = InMemoryError::DuplicateKey(format!(
                "{}/{}/{}/{}",
                key.application_id, key.job_id, key.job_status_timestamp, key.business_date
            ));
            return Err(storage_error("insert job status", err));
        }

        rows.push(job_status.clone());
        Ok(())
    }

    async fn get_by_query(&self, predicate: &QueryPredicate) -> SloResult<Vec<JobStatus>> {
        let rows = self.lock("select job statuses")?;

        Ok(rows
            .iter()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect())
    }

    async fn close(&self) -> SloResult<()> {
        Ok(())
    }
}
