use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Query},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use slo_core::{ErrorCode, ErrorRecord, JobStatusDto};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::RequestContext;
use crate::controller::Handled;

fn render<T: Serialize>(handled: Handled<T>) -> axum::response::Response {
    let status = handled.status.http();
    match handled.outcome {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => errors::error_record_response(status, &err),
    }
}

/// `POST /job-statuses`
pub async fn add(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<JobStatusDto>, JsonRejection>,
) -> axum::response::Response {
    let input = body
        .map(|Json(dto)| dto)
        .map_err(|rejection| ErrorRecord::new(ErrorCode::JsonDecodeError, rejection.body_text()));

    let handled = services.controller().add(input).await;
    if let Ok(js) = &handled.outcome {
        tracing::info!(
            request_id = ctx.request_id(),
            application_id = js.application_id(),
            job_id = js.job_id(),
            job_status_code = %js.job_status_code(),
            "job status recorded"
        );
    }
    render(handled)
}

/// `GET /job-statuses?jobId=...&businessDate=...`
///
/// Parameters are kept as ordered pairs; repeated names are passed through
/// and resolved by the translator.
pub async fn get_by_query(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> axum::response::Response {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            let err = ErrorRecord::new(ErrorCode::AppTermInvalid, rejection.body_text());
            return render(Handled::<()>::rejected(err));
        }
    };

    render(services.controller().get_by_query(&pairs).await)
}
