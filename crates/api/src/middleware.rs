use axum::{
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use crate::context::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Assign a request id, log receipt and completion, echo the id back.
///
/// A caller-supplied `x-request-id` is reused when it is printable and short;
/// otherwise a fresh UUIDv7 is minted.
pub async fn request_context(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = incoming_request_id(req.headers()).unwrap_or_else(|| Uuid::now_v7().to_string());
    let ctx = RequestContext::new(request_id.clone(), Utc::now());
    req.extensions_mut().insert(ctx.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path()
    );

    async move {
        tracing::info!("request received");

        let mut res = next.run(req).await;

        tracing::info!(
            status = res.status().as_u16(),
            elapsed_ms = ctx.elapsed_ms(Utc::now()),
            "responding"
        );

        if let Ok(value) = HeaderValue::from_str(ctx.request_id()) {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        res
    }
    .instrument(span)
    .await
}

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(raw.to_string())
}
