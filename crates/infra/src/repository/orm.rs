//! Diesel-backed job status repository.
//!
//! Same table and semantics as the sqlx backend, built through diesel's query
//! DSL over an r2d2 pool. Diesel is synchronous, so every call runs on the
//! blocking pool.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::instrument;

use slo_core::{
    BusinessDate, ErrorCode, ErrorRecord, JobStatus, JobStatusDto, JobStatusField, QueryPredicate,
    QueryValue, SloResult,
};

use super::classify::storage_error;
use super::postgres::{revalidate, CREATE_TABLE_SQL};
use super::r#trait::JobStatusRepo;
use super::schema::job_status;
use crate::config::StorageConfig;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = job_status)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct JobStatusModel {
    application_id: String,
    job_id: String,
    job_status_code: String,
    job_status_timestamp: DateTime<Utc>,
    business_date: NaiveDate,
    run_id: String,
    host_id: String,
}

impl From<&JobStatus> for JobStatusModel {
    fn from(js: &JobStatus) -> Self {
        Self {
            application_id: js.application_id().to_string(),
            job_id: js.job_id().to_string(),
            job_status_code: js.job_status_code().as_str().to_string(),
            job_status_timestamp: js.job_status_timestamp(),
            business_date: js.business_date().as_naive(),
            run_id: js.run_id().to_string(),
            host_id: js.host_id().to_string(),
        }
    }
}

impl From<JobStatusModel> for JobStatusDto {
    fn from(model: JobStatusModel) -> Self {
        Self {
            application_id: model.application_id,
            job_id: model.job_id,
            job_status_code: model.job_status_code,
            job_status_timestamp: model.job_status_timestamp,
            business_date: BusinessDate::from_naive(model.business_date),
            run_id: model.run_id,
            host_id: model.host_id,
        }
    }
}

/// Pool slot; `None` once closed.
#[derive(Clone)]
pub struct OrmJobStatusRepo {
    pool: Arc<RwLock<Option<DbPool>>>,
}

impl OrmJobStatusRepo {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool: Arc::new(RwLock::new(Some(pool))),
        }
    }

    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &StorageConfig) -> SloResult<Self> {
        let url = config.require_database_url()?.to_string();
        let max_size = config.max_connections;
        let timeout: Duration = config.acquire_timeout;

        let pool = run_blocking(move || {
            Pool::builder()
                .max_size(max_size)
                .connection_timeout(timeout)
                .build(ConnectionManager::<PgConnection>::new(url))
                .map_err(|e| storage_error("connect", e))
        })
        .await?;

        let repo = Self::new(pool);
        if config.ensure_schema {
            repo.ensure_schema().await?;
        }

        tracing::info!("orm job status repository ready");
        Ok(repo)
    }

    pub async fn ensure_schema(&self) -> SloResult<()> {
        let pool = self.current_pool()?;
        run_blocking(move || {
            let mut conn = get_conn(&pool)?;
            diesel::sql_query(CREATE_TABLE_SQL)
                .execute(&mut conn)
                .map_err(|e| storage_error("create table", e))?;
            Ok(())
        })
        .await
    }

    /// Clone of the live pool, or a connection error after `close`.
    fn current_pool(&self) -> SloResult<DbPool> {
        let slot = self.pool.read().map_err(|_| {
            ErrorRecord::new(ErrorCode::RepoOther, "orm pool lock poisoned")
        })?;
        slot.clone()
            .ok_or_else(|| ErrorRecord::new(ErrorCode::RepoConnException, "orm pool is closed"))
    }
}

fn get_conn(pool: &DbPool) -> SloResult<DbConnection> {
    pool.get().map_err(|e| storage_error("get connection", e))
}

async fn run_blocking<T, F>(work: F) -> SloResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> SloResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        ErrorRecord::new(ErrorCode::RepoOther, format!("blocking task failed: {e}"))
    })?
}

fn mismatch(field: JobStatusField, value: &QueryValue) -> ErrorRecord {
    ErrorRecord::new(
        ErrorCode::RepoInvalidQuery,
        format!("{} cannot be compared with {value:?}", field.external_name()),
    )
}

/// Diesel's boxed select over the job status table, filtered by `predicate`.
fn filtered(predicate: &QueryPredicate) -> SloResult<job_status::BoxedQuery<'static, diesel::pg::Pg>> {
    use JobStatusField as F;

    let mut query = job_status::table.into_boxed();
    for term in predicate.terms() {
        query = match (term.field, &term.value) {
            (F::ApplicationId, QueryValue::Text(v)) => query.filter(job_status::application_id.eq(v.clone())),
            (F::JobId, QueryValue::Text(v)) => query.filter(job_status::job_id.eq(v.clone())),
            (F::JobStatusCode, QueryValue::Text(v)) => query.filter(job_status::job_status_code.eq(v.clone())),
            (F::JobStatusTimestamp, QueryValue::Timestamp(ts)) => query.filter(job_status::job_status_timestamp.eq(*ts)),
            (F::BusinessDate, QueryValue::Date(d)) => query.filter(job_status::business_date.eq(d.as_naive())),
            (F::RunId, QueryValue::Text(v)) => query.filter(job_status::run_id.eq(v.clone())),
            (F::HostId, QueryValue::Text(v)) => query.filter(job_status::host_id.eq(v.clone())),
            (field, value) => return Err(mismatch(field, value)),
        };
    }
    Ok(query)
}

#[async_trait]
impl JobStatusRepo for OrmJobStatusRepo {
    #[instrument(
        skip(self, job_status),
        fields(
            application_id = %job_status.application_id(),
            job_id = %job_status.job_id()
        ),
        err
    )]
    async fn add(&self, job_status: &JobStatus) -> SloResult<()> {
        let pool = self.current_pool()?;
        let model = JobStatusModel::from(job_status);

        run_blocking(move || {
            let mut conn = get_conn(&pool)?;
            diesel::insert_into(job_status::table)
                .values(&model)
                .execute(&mut conn)
                .map_err(|e| storage_error("insert job status", e))?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), err)]
    async fn get_by_query(&self, predicate: &QueryPredicate) -> SloResult<Vec<JobStatus>> {
        let pool = self.current_pool()?;
        let query = filtered(predicate)?;

        let models = run_blocking(move || {
            let mut conn = get_conn(&pool)?;
            query
                .load::<JobStatusModel>(&mut conn)
                .map_err(|e| storage_error("select job statuses", e))
        })
        .await?;

        models
            .into_iter()
            .map(|model| revalidate(model.into()))
            .collect()
    }

    async fn close(&self) -> SloResult<()> {
        let mut slot = self.pool.write().map_err(|_| {
            ErrorRecord::new(ErrorCode::RepoOther, "orm pool lock poisoned")
        })?;
        // r2d2 closes idle connections when the last handle drops.
        slot.take();
        Ok(())
    }
}
