//! Transport-neutral adapter between decoded requests and the use cases.
//!
//! The controller never sees raw bytes: the HTTP layer hands it either a
//! decoded DTO or an already-classified decode failure. Its only policy is
//! [`TransportStatus::for_code`], the single table deciding which error codes
//! are the caller's fault.

use axum::http::StatusCode;

use slo_core::{ErrorCode, ErrorRecord, JobStatus, JobStatusDto};
use slo_infra::{JobStatusRepo, JobStatusUseCases};

/// Codes that mean "the request was wrong"; everything else is on us.
pub const CALLER_FAULT_CODES: [ErrorCode; 6] = [
    ErrorCode::DomainProps,
    ErrorCode::AppTermMissing,
    ErrorCode::AppTermInvalid,
    ErrorCode::RepoDupeRow,
    ErrorCode::RepoInvalidQuery,
    ErrorCode::JsonDecodeError,
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    Ok,
    BadRequest,
    InternalError,
}

impl TransportStatus {
    pub fn for_code(code: ErrorCode) -> Self {
        if CALLER_FAULT_CODES.contains(&code) {
            Self::BadRequest
        } else {
            Self::InternalError
        }
    }

    pub fn http(&self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Outcome of one controller call, ready for the transport to render.
#[derive(Debug)]
pub struct Handled<T> {
    pub status: TransportStatus,
    pub outcome: Result<T, ErrorRecord>,
}

impl<T> Handled<T> {
    /// A failure caught before reaching the controller (e.g. undecodable input).
    pub fn rejected(err: ErrorRecord) -> Self {
        Self::from_result(Err(err))
    }

    fn from_result(outcome: Result<T, ErrorRecord>) -> Self {
        let status = match &outcome {
            Ok(_) => TransportStatus::Ok,
            Err(err) => {
                let status = TransportStatus::for_code(err.code());
                log_failure(status, err);
                status
            }
        };
        Self { status, outcome }
    }
}

fn log_failure(status: TransportStatus, err: &ErrorRecord) {
    let data = err.data().map(|d| d.to_string()).unwrap_or_default();
    match status {
        TransportStatus::InternalError => tracing::error!(
            code = %err.code(),
            cause = err.cause(),
            context = ?err.context(),
            data = %data,
            "request failed"
        ),
        _ => tracing::warn!(
            code = %err.code(),
            cause = err.cause(),
            context = ?err.context(),
            data = %data,
            "request rejected"
        ),
    }
}

pub struct JobStatusController<R> {
    use_cases: JobStatusUseCases<R>,
}

impl<R> JobStatusController<R>
where
    R: JobStatusRepo,
{
    pub fn new(use_cases: JobStatusUseCases<R>) -> Self {
        Self { use_cases }
    }

    pub fn use_cases(&self) -> &JobStatusUseCases<R> {
        &self.use_cases
    }

    pub async fn add(&self, input: Result<JobStatusDto, ErrorRecord>) -> Handled<JobStatus> {
        let outcome = match input {
            Ok(dto) => self.use_cases.add(dto).await,
            Err(err) => Err(err.wrap("decode job status")),
        };
        Handled::from_result(outcome)
    }

    pub async fn get_by_query(&self, query: &[(String, String)]) -> Handled<Vec<JobStatus>> {
        Handled::from_result(self.use_cases.get_by_query(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use slo_infra::InMemoryJobStatusRepo;

    fn controller() -> JobStatusController<InMemoryJobStatusRepo> {
        JobStatusController::new(JobStatusUseCases::new(InMemoryJobStatusRepo::new()))
    }

    fn dto() -> JobStatusDto {
        serde_json::from_value(serde_json::json!({
            "applicationId": "App1",
            "jobId": "Job1",
            "jobStatusCode": "start",
            "jobStatusTimestamp": "2023-06-02T00:52:32Z",
            "businessDate": "2023-06-01",
            "runId": "",
            "hostId": ""
        }))
        .unwrap()
    }

    #[test]
    fn status_table() {
        for code in ErrorCode::ALL {
            let expected = if CALLER_FAULT_CODES.contains(&code) {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            assert_eq!(TransportStatus::for_code(code).http(), expected, "{code}");
        }
        assert_eq!(TransportStatus::for_code(ErrorCode::RepoDupeRow), TransportStatus::BadRequest);
        assert_eq!(TransportStatus::for_code(ErrorCode::RepoConnException), TransportStatus::InternalError);
        assert_eq!(TransportStatus::for_code(ErrorCode::RepoNoDsn), TransportStatus::InternalError);
        assert_eq!(TransportStatus::Ok.http(), StatusCode::OK);
    }

    #[tokio::test]
    async fn add_success_is_ok() {
        let handled = controller().add(Ok(dto())).await;
        assert_eq!(handled.status, TransportStatus::Ok);
        assert_eq!(handled.outcome.unwrap().job_status_code().as_str(), "START");
    }

    #[tokio::test]
    async fn decode_failure_is_bad_request_and_keeps_code() {
        let decode = ErrorRecord::new(ErrorCode::JsonDecodeError, "expected value at line 1");
        let handled = controller().add(Err(decode)).await;
        assert_eq!(handled.status, TransportStatus::BadRequest);
        assert_eq!(handled.outcome.unwrap_err().code(), ErrorCode::JsonDecodeError);
    }

    #[tokio::test]
    async fn validation_and_duplicate_are_bad_request() {
        let c = controller();

        let mut future = dto();
        future.job_status_timestamp = Utc::now() + Duration::minutes(1);
        assert_eq!(c.add(Ok(future)).await.status, TransportStatus::BadRequest);

        assert_eq!(c.add(Ok(dto())).await.status, TransportStatus::Ok);
        let dupe = c.add(Ok(dto())).await;
        assert_eq!(dupe.status, TransportStatus::BadRequest);
        assert_eq!(dupe.outcome.unwrap_err().code(), ErrorCode::RepoDupeRow);
    }

    #[tokio::test]
    async fn query_outcomes() {
        let c = controller();
        c.add(Ok(dto())).await.outcome.unwrap();

        let missing = c.get_by_query(&[]).await;
        assert_eq!(missing.status, TransportStatus::BadRequest);

        let found = c
            .get_by_query(&[
                ("jobId".to_string(), "Job1".to_string()),
                ("businessDate".to_string(), "2023-06-01".to_string()),
            ])
            .await;
        assert_eq!(found.status, TransportStatus::Ok);
        assert_eq!(found.outcome.unwrap().len(), 1);
    }
}
