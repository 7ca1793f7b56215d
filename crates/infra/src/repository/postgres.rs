//! Postgres-backed job status repository (sqlx).
//!
//! ## Error Mapping
//!
//! Driver errors go through [`storage_error`](super::classify::storage_error):
//!
//! | SQLx Error | PostgreSQL Error Code | ErrorCode |
//! |------------|----------------------|-----------|
//! | Database (unique violation) | `23505` | `RepoDupeRow` |
//! | Database (connection exception) | `08xxx` | `RepoConnException` |
//! | Io / Tls / PoolTimedOut / PoolClosed | N/A | `RepoConnException` |
//! | Anything else | Any other | `RepoOther` |
//!
//! Rows that fail to decode, or that no longer pass validation, are
//! `RepoScan`.
//!
//! ## Thread Safety
//!
//! `PostgresJobStatusRepo` is `Send + Sync`; the sqlx pool handles connection
//! sharing. Each operation is a single statement with no explicit transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use tracing::{instrument, Span};

use slo_core::{
    BusinessDate, ErrorCode, ErrorRecord, JobStatus, JobStatusDto, QueryPredicate, QueryValue,
    SloResult,
};

use super::classify::storage_error;
use super::r#trait::JobStatusRepo;
use crate::config::StorageConfig;

/// DDL for the job status table. Column names are quoted PascalCase.
pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "JobStatus" (
    "ApplicationId"      VARCHAR(200) NOT NULL,
    "JobId"              VARCHAR(200) NOT NULL,
    "JobStatusCode"      VARCHAR(20)  NOT NULL,
    "JobStatusTimestamp" TIMESTAMPTZ  NOT NULL,
    "BusinessDate"       DATE         NOT NULL,
    "RunId"              VARCHAR(50)  NOT NULL DEFAULT '',
    "HostId"             VARCHAR(150) NOT NULL DEFAULT '',
    PRIMARY KEY ("ApplicationId", "JobId", "JobStatusTimestamp", "BusinessDate")
)
"#;

const INSERT_SQL: &str = r#"
INSERT INTO "JobStatus"
    ("ApplicationId", "JobId", "JobStatusCode", "JobStatusTimestamp", "BusinessDate", "RunId", "HostId")
VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

const SELECT_SQL: &str = r#"SELECT "ApplicationId", "JobId", "JobStatusCode", "JobStatusTimestamp", "BusinessDate", "RunId", "HostId" FROM "JobStatus""#;

#[derive(Debug, Clone)]
pub struct PostgresJobStatusRepo {
    pool: PgPool,
}

impl PostgresJobStatusRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from `config`. Fails with `RepoNoDsn` before any network
    /// I/O when no DSN is configured.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &StorageConfig) -> SloResult<Self> {
        let url = config.require_database_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| storage_error("connect", e))?;

        let repo = Self::new(pool);
        if config.ensure_schema {
            repo.ensure_schema().await?;
        }

        tracing::info!("postgres job status repository ready");
        Ok(repo)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> SloResult<()> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("create table", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobStatusRepo for PostgresJobStatusRepo {
    #[instrument(
        skip(self, job_status),
        fields(
            application_id = %job_status.application_id(),
            job_id = %job_status.job_id()
        ),
        err
    )]
    async fn add(&self, job_status: &JobStatus) -> SloResult<()> {
        sqlx::query(INSERT_SQL)
            .bind(job_status.application_id())
            .bind(job_status.job_id())
            .bind(job_status.job_status_code().as_str())
            .bind(job_status.job_status_timestamp())
            .bind(job_status.business_date().as_naive())
            .bind(job_status.run_id())
            .bind(job_status.host_id())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("insert job status", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(rows = tracing::field::Empty), err)]
    async fn get_by_query(&self, predicate: &QueryPredicate) -> SloResult<Vec<JobStatus>> {
        let filter = predicate.to_sql();
        let sql = format!("{SELECT_SQL}{}", filter.where_suffix());

        let mut query = sqlx::query::<Postgres>(&sql);
        for arg in filter.args {
            query = match arg {
                QueryValue::Text(v) => query.bind(v),
                QueryValue::Timestamp(ts) => query.bind(ts),
                QueryValue::Date(d) => query.bind(d.as_naive()),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("select job statuses", e))?;

        let job_statuses = rows
            .iter()
            .map(scan_row)
            .collect::<SloResult<Vec<_>>>()?;

        Span::current().record("rows", job_statuses.len());
        Ok(job_statuses)
    }

    async fn close(&self) -> SloResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Decode one row and run it back through validation.
fn scan_row(row: &PgRow) -> SloResult<JobStatus> {
    let dto = decode_row(row).map_err(|e| {
        ErrorRecord::new(ErrorCode::RepoScan, format!("decode job status row: {e}"))
    })?;
    revalidate(dto)
}

fn decode_row(row: &PgRow) -> Result<JobStatusDto, sqlx::Error> {
    Ok(JobStatusDto {
        application_id: row.try_get("ApplicationId")?,
        job_id: row.try_get("JobId")?,
        job_status_code: row.try_get("JobStatusCode")?,
        job_status_timestamp: row.try_get::<DateTime<Utc>, _>("JobStatusTimestamp")?,
        business_date: BusinessDate::from_naive(row.try_get::<NaiveDate, _>("BusinessDate")?),
        run_id: row.try_get("RunId")?,
        host_id: row.try_get("HostId")?,
    })
}

/// Stored rows are re-checked on the way out; anything that no longer
/// validates is a scan failure carrying the violations.
pub(crate) fn revalidate(dto: JobStatusDto) -> SloResult<JobStatus> {
    JobStatus::new(dto).map_err(|e| {
        ErrorRecord::new(ErrorCode::RepoScan, "stored job status failed validation")
            .with_data(&e.violations())
    })
}
