use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use slo_core::ErrorRecord;

/// Error body for a taxonomy-tagged failure: `{error, message, details}`.
pub fn error_record_response(status: StatusCode, err: &ErrorRecord) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": err.code(),
            "message": err.cause(),
            "details": err.data(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
