//! Contract tests shared by every repository backend.
//!
//! Verifies:
//! - add then query returns exactly the matching rows
//! - duplicate keys surface as `RepoDupeRow`
//! - zero matches is an empty result
//! - close is idempotent
//!
//! The Postgres and ORM runs need a live database and are `#[ignore]`d; run
//! them with `DATABASE_URL=... cargo test -p slo-infra --all-features -- --ignored`.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use slo_core::{translate, ErrorCode, JobStatus, JobStatusDto};

    use crate::config::{StorageBackend, StorageConfig};
    use crate::repository::{InMemoryJobStatusRepo, JobStatusRepo};
    use crate::use_cases::JobStatusUseCases;

    fn job_status(app: &str, job: &str, ts: DateTime<Utc>, date: &str) -> JobStatus {
        JobStatus::new(JobStatusDto {
            application_id: app.to_string(),
            job_id: job.to_string(),
            job_status_code: "succeed".to_string(),
            job_status_timestamp: ts,
            business_date: date.parse().unwrap(),
            run_id: "run-1".to_string(),
            host_id: "host-a".to_string(),
        })
        .unwrap()
    }

    /// `app` scopes the rows so reruns against a shared database don't collide.
    async fn exercise_contract<R: JobStatusRepo>(repo: &R, app: &str) {
        let rows = [
            job_status(app, "Job1", Utc.with_ymd_and_hms(2023, 6, 1, 1, 0, 0).unwrap(), "2023-06-01"),
            job_status(app, "Job1", Utc.with_ymd_and_hms(2023, 6, 2, 1, 0, 0).unwrap(), "2023-06-02"),
            job_status(app, "Job1", Utc.with_ymd_and_hms(2023, 6, 2, 9, 30, 0).unwrap(), "2023-06-02"),
        ];
        for row in &rows {
            repo.add(row).await.unwrap();
        }

        let err = repo.add(&rows[0]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RepoDupeRow);

        let predicate = translate([
            ("applicationId", app),
            ("jobId", "Job1"),
            ("businessDate", "2023-06-02"),
        ])
        .unwrap();
        let mut found = repo.get_by_query(&predicate).await.unwrap();
        found.sort_by_key(|js| js.job_status_timestamp());
        assert_eq!(found, rows[1..].to_vec());

        let predicate = translate([
            ("applicationId", app),
            ("jobStatusTimestamp", "2023-06-02T11:30:00+02:00"),
        ])
        .unwrap();
        assert_eq!(repo.get_by_query(&predicate).await.unwrap(), vec![rows[2].clone()]);

        let predicate = translate([("applicationId", app), ("jobId", "Job9")]).unwrap();
        assert!(repo.get_by_query(&predicate).await.unwrap().is_empty());

        repo.close().await.unwrap();
        repo.close().await.unwrap();
    }

    fn run_scope(prefix: &str) -> String {
        format!("{prefix}-{}", Utc::now().timestamp_millis())
    }

    fn live_config(backend: StorageBackend) -> StorageConfig {
        let mut config = StorageConfig::from_env().unwrap();
        config.backend = backend;
        config.ensure_schema = true;
        config
    }

    #[tokio::test]
    async fn in_memory_honours_contract() {
        exercise_contract(&InMemoryJobStatusRepo::new(), "App1").await;
    }

    #[tokio::test]
    async fn use_cases_over_in_memory_store() {
        let use_cases = JobStatusUseCases::new(InMemoryJobStatusRepo::new());
        let dto = JobStatusDto::from(&job_status(
            "App1",
            "Job1",
            Utc.with_ymd_and_hms(2023, 6, 2, 0, 52, 32).unwrap(),
            "2023-06-01",
        ));

        use_cases.add(dto).await.unwrap();

        let query = vec![
            ("applicationId".to_string(), "App1".to_string()),
            ("businessDate".to_string(), "2023-06-01".to_string()),
        ];
        assert_eq!(use_cases.get_by_query(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable Postgres"]
    async fn postgres_honours_contract() {
        let config = live_config(StorageBackend::Postgres);
        let repo = crate::repository::PostgresJobStatusRepo::connect(&config)
            .await
            .unwrap();
        exercise_contract(&repo, &run_scope("sqlx")).await;
    }

    #[cfg(feature = "orm")]
    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "needs DATABASE_URL pointing at a disposable Postgres"]
    async fn orm_honours_contract() {
        let config = live_config(StorageBackend::Orm);
        let repo = crate::repository::OrmJobStatusRepo::connect(&config)
            .await
            .unwrap();
        exercise_contract(&repo, &run_scope("orm")).await;
    }
}
