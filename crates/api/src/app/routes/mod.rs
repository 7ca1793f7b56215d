use axum::{routing::get, Router};

pub mod job_statuses;
pub mod system;

/// Router for the job status endpoints.
pub fn router() -> Router {
    Router::new().route(
        "/job-statuses",
        get(job_statuses::get_by_query).post(job_statuses::add),
    )
}
