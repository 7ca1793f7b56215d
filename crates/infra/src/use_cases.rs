//! Application use cases: validate, translate, call the repository.
//!
//! ```text
//! Add:        dto ─► JobStatus::new ─► repo.add
//! GetByQuery: raw query ─► term check ─► translate ─► repo.get_by_query
//! ```
//!
//! Errors are wrapped with a note, never replaced; the code set where the
//! failure started is what the transport layer sees.

use tracing::instrument;

use slo_core::{translate, ErrorCode, ErrorRecord, JobStatus, JobStatusDto, SloResult};

use crate::repository::JobStatusRepo;

/// Query names that identify the job.
pub const IDENTIFYING_TERMS: [&str; 2] = ["jobId", "applicationId"];
/// Query names that pin the query in time.
pub const TEMPORAL_TERMS: [&str; 2] = ["jobStatusTimestamp", "businessDate"];

pub struct JobStatusUseCases<R> {
    repo: R,
}

impl<R> JobStatusUseCases<R>
where
    R: JobStatusRepo,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Validate and store one job status. Validation failures never reach
    /// the repository.
    #[instrument(
        skip(self, dto),
        fields(application_id = %dto.application_id, job_id = %dto.job_id),
        err
    )]
    pub async fn add(&self, dto: JobStatusDto) -> SloResult<JobStatus> {
        let job_status = JobStatus::new(dto).map_err(|e| e.wrap("validate job status"))?;

        self.repo
            .add(&job_status)
            .await
            .map_err(|e| e.wrap("store job status"))?;

        Ok(job_status)
    }

    /// Look up job statuses by raw query parameters.
    ///
    /// The query needs at least one identifying term and one temporal term
    /// (with a non-empty value), otherwise `AppTermMissing` is returned
    /// without touching storage. `RepoNotFound` from a backend is reported as
    /// an empty result.
    #[instrument(skip(self), err)]
    pub async fn get_by_query(&self, query: &[(String, String)]) -> SloResult<Vec<JobStatus>> {
        if !has_any(query, &IDENTIFYING_TERMS) || !has_any(query, &TEMPORAL_TERMS) {
            let present: Vec<&str> = query.iter().map(|(k, _)| k.as_str()).collect();
            return Err(ErrorRecord::new(
                ErrorCode::AppTermMissing,
                "query needs jobId or applicationId, and jobStatusTimestamp or businessDate",
            )
            .with_data(&present));
        }

        let predicate = translate(query.iter().map(|(k, v)| (k, v))).map_err(|e| e.wrap("translate query"))?;

        match self.repo.get_by_query(&predicate).await {
            Ok(rows) => Ok(rows),
            Err(e) if e.code() == ErrorCode::RepoNotFound => {
                tracing::debug!("repository reported not found; returning empty result");
                Ok(Vec::new())
            }
            Err(e) => Err(e.wrap("query job statuses")),
        }
    }
}

fn has_any(query: &[(String, String)], names: &[&str]) -> bool {
    query
        .iter()
        .any(|(k, v)| !v.is_empty() && names.contains(&k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use slo_core::{BusinessDate, QueryPredicate};

    use crate::repository::InMemoryJobStatusRepo;

    /// Counts calls and answers every one with a fixed outcome.
    struct RecordingRepo {
        calls: AtomicUsize,
        fail_with: Option<ErrorCode>,
    }

    impl RecordingRepo {
        fn new(fail_with: Option<ErrorCode>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_with,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn outcome<T: Default>(&self) -> SloResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(code) => Err(ErrorRecord::new(code, "recorded failure")),
                None => Ok(T::default()),
            }
        }
    }

    #[async_trait]
    impl JobStatusRepo for RecordingRepo {
        async fn add(&self, _: &JobStatus) -> SloResult<()> {
            self.outcome()
        }

        async fn get_by_query(&self, _: &QueryPredicate) -> SloResult<Vec<JobStatus>> {
            self.outcome()
        }

        async fn close(&self) -> SloResult<()> {
            Ok(())
        }
    }

    fn dto(job_id: &str, ts: &str, business_date: &str) -> JobStatusDto {
        JobStatusDto {
            application_id: "App1".to_string(),
            job_id: job_id.to_string(),
            job_status_code: "start".to_string(),
            job_status_timestamp: ts.parse().unwrap(),
            business_date: business_date.parse().unwrap(),
            run_id: String::new(),
            host_id: String::new(),
        }
    }

    fn query(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn add_normalizes_and_stores() {
        let use_cases = JobStatusUseCases::new(InMemoryJobStatusRepo::new());

        let js = use_cases
            .add(dto("Job1", "2023-06-02T00:52:32Z", "2023-06-01"))
            .await
            .unwrap();

        assert_eq!(js.job_status_code().as_str(), "START");
        assert_eq!(js.business_date(), BusinessDate::from_ymd(2023, 6, 1).unwrap());

        let stored = use_cases
            .get_by_query(&query(&[("jobId", "Job1"), ("businessDate", "2023-06-01")]))
            .await
            .unwrap();
        assert_eq!(stored, vec![js]);
    }

    #[tokio::test]
    async fn invalid_add_never_reaches_storage() {
        let repo = RecordingRepo::new(None);
        let use_cases = JobStatusUseCases::new(repo.clone());

        let mut future = dto("Job1", "2023-06-02T00:52:32Z", "2023-06-01");
        future.job_status_timestamp = Utc::now() + Duration::minutes(1);

        let err = use_cases.add(future).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DomainProps);
        assert!(err.violations().iter().any(|v| v.starts_with("invalid JobTimestamp")));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn duplicate_add_keeps_repository_code() {
        let use_cases = JobStatusUseCases::new(InMemoryJobStatusRepo::new());
        let input = dto("Job1", "2023-06-02T00:52:32Z", "2023-06-01");

        use_cases.add(input.clone()).await.unwrap();
        let err = use_cases.add(input).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::RepoDupeRow);
        assert!(err.context().iter().any(|c| c.ends_with("store job status")));
    }

    #[tokio::test]
    async fn missing_terms_never_reach_storage() {
        let repo = RecordingRepo::new(None);
        let use_cases = JobStatusUseCases::new(repo.clone());

        for raw in [
            query(&[]),
            query(&[("jobId", "Job1")]),
            query(&[("businessDate", "2023-06-01")]),
            query(&[("jobId", ""), ("businessDate", "2023-06-01")]),
            query(&[("runId", "r1"), ("hostId", "h1")]),
        ] {
            let err = use_cases.get_by_query(&raw).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::AppTermMissing, "query {raw:?}");
        }
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_temporal_term_is_invalid() {
        let repo = RecordingRepo::new(None);
        let use_cases = JobStatusUseCases::new(repo.clone());

        let err = use_cases
            .get_by_query(&query(&[("applicationId", "App1"), ("jobStatusTimestamp", "yesterday")]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::AppTermInvalid);
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn not_found_becomes_empty_result() {
        let repo = RecordingRepo::new(Some(ErrorCode::RepoNotFound));
        let use_cases = JobStatusUseCases::new(repo.clone());

        let rows = use_cases
            .get_by_query(&query(&[("jobId", "Job1"), ("businessDate", "2023-06-02")]))
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn other_repository_errors_propagate_unchanged_in_code() {
        let repo = RecordingRepo::new(Some(ErrorCode::RepoConnException));
        let use_cases = JobStatusUseCases::new(repo);

        let err = use_cases
            .get_by_query(&query(&[("jobId", "Job1"), ("businessDate", "2023-06-02")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RepoConnException);

        let err = use_cases
            .add(dto("Job1", "2023-06-02T00:52:32Z", "2023-06-01"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RepoConnException);
    }

    #[tokio::test]
    async fn seeded_query_returns_only_matching_rows() {
        let seed = [
            ("Job1", Utc.with_ymd_and_hms(2023, 6, 1, 1, 0, 0).unwrap(), "2023-06-01"),
            ("Job1", Utc.with_ymd_and_hms(2023, 6, 2, 1, 0, 0).unwrap(), "2023-06-02"),
            ("Job1", Utc.with_ymd_and_hms(2023, 6, 2, 2, 0, 0).unwrap(), "2023-06-02"),
            ("Job2", Utc.with_ymd_and_hms(2023, 6, 2, 3, 0, 0).unwrap(), "2023-06-02"),
        ];
        let rows: Vec<JobStatus> = seed
            .iter()
            .map(|(job, ts, date)| {
                let mut d = dto(job, "2023-06-02T00:00:00Z", date);
                d.job_status_timestamp = *ts;
                JobStatus::new(d).unwrap()
            })
            .collect();
        let use_cases = JobStatusUseCases::new(InMemoryJobStatusRepo::with_rows(rows.clone()));

        let found = use_cases
            .get_by_query(&query(&[("jobId", "Job1"), ("businessDate", "2023-06-02")]))
            .await
            .unwrap();

        assert_eq!(found, vec![rows[1].clone(), rows[2].clone()]);
    }
}
