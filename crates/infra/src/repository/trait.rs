use std::sync::Arc;

use async_trait::async_trait;

use slo_core::{JobStatus, QueryPredicate, SloResult};

/// Storage boundary for job status records.
///
/// Every backend (SQL, ORM, in-memory) honours the same contract:
///
/// - `add` inserts one record; a collision on
///   `(applicationId, jobId, jobStatusTimestamp, businessDate)` is `RepoDupeRow`
/// - `get_by_query` returns all matching records in storage order; zero matches
///   is an empty `Vec`, not an error
/// - `close` releases the pool; calling it twice, or on a repository that
///   never connected, is fine
///
/// Backend failures are reported through the storage classifier, so callers
/// only ever see taxonomy codes.
#[async_trait]
pub trait JobStatusRepo: Send + Sync {
    async fn add(&self, job_status: &JobStatus) -> SloResult<()>;

    async fn get_by_query(&self, predicate: &QueryPredicate) -> SloResult<Vec<JobStatus>>;

    async fn close(&self) -> SloResult<()>;
}

#[async_trait]
impl<S> JobStatusRepo for Arc<S>
where
    S: JobStatusRepo + ?Sized,
{
    async fn add(&self, job_status: &JobStatus) -> SloResult<()> {
        (**self).add(job_status).await
    }

    async fn get_by_query(&self, predicate: &QueryPredicate) -> SloResult<Vec<JobStatus>> {
        (**self).get_by_query(predicate).await
    }

    async fn close(&self) -> SloResult<()> {
        (**self).close().await
    }
}
