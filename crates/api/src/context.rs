use chrono::{DateTime, Utc};

/// Per-request metadata set by the request middleware.
///
/// Handlers can extract it with `Extension<RequestContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            request_id: request_id.into(),
            received_at,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Milliseconds since the request was received.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.received_at).num_milliseconds()
    }
}
