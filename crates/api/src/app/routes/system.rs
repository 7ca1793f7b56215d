use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::app::errors;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn not_found() -> impl IntoResponse {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such route")
}
