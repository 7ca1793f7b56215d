//! Error taxonomy shared by every layer.
//!
//! An [`ErrorRecord`] is created where a failure happens, tagged with a closed
//! [`ErrorCode`], and wrapped (never replaced) on its way up to the transport
//! boundary. The code assigned at the origin is the only thing the transport
//! looks at when it picks a status.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Result type used across the job status pipeline.
pub type SloResult<T> = Result<T, ErrorRecord>;

/// Closed vocabulary of failure kinds.
///
/// The string form (see [`ErrorCode::as_str`]) is stable and is what gets logged
/// and returned to callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input failed business validation; data is the list of violations.
    DomainProps,
    /// Transport payload could not be decoded.
    JsonDecodeError,
    /// Query lacks a required identifying or temporal term.
    AppTermMissing,
    /// Query term could not be parsed for its field.
    AppTermInvalid,
    /// Unique key collision on insert.
    RepoDupeRow,
    /// Connection or transport failure talking to storage.
    RepoConnException,
    /// Storage failure that could not be classified further.
    RepoOther,
    /// Storage reported that nothing matched.
    RepoNotFound,
    /// Storage could not express the requested filter.
    RepoInvalidQuery,
    /// Storage was opened without a connection string.
    RepoNoDsn,
    /// A stored row could not be decoded back into a job status.
    RepoScan,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 11] = [
        ErrorCode::DomainProps,
        ErrorCode::JsonDecodeError,
        ErrorCode::AppTermMissing,
        ErrorCode::AppTermInvalid,
        ErrorCode::RepoDupeRow,
        ErrorCode::RepoConnException,
        ErrorCode::RepoOther,
        ErrorCode::RepoNotFound,
        ErrorCode::RepoInvalidQuery,
        ErrorCode::RepoNoDsn,
        ErrorCode::RepoScan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DomainProps => "DomainProps",
            ErrorCode::JsonDecodeError => "JsonDecodeError",
            ErrorCode::AppTermMissing => "AppTermMissing",
            ErrorCode::AppTermInvalid => "AppTermInvalid",
            ErrorCode::RepoDupeRow => "RepoDupeRow",
            ErrorCode::RepoConnException => "RepoConnException",
            ErrorCode::RepoOther => "RepoOther",
            ErrorCode::RepoNotFound => "RepoNotFound",
            ErrorCode::RepoInvalidQuery => "RepoInvalidQuery",
            ErrorCode::RepoNoDsn => "RepoNoDsn",
            ErrorCode::RepoScan => "RepoScan",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Taxonomy-tagged error carrier.
///
/// `context` is a stack of `file:line` entries: the first one is the origin,
/// every [`ErrorRecord::wrap`] appends another. Nothing is ever removed.
/// A driver error, when there is one, stays reachable through `source()`.
#[derive(Debug, Clone, Error)]
#[error("{} Code {code} | {cause}", .context.join(" <- "))]
pub struct ErrorRecord {
    code: ErrorCode,
    cause: String,
    data: Option<JsonValue>,
    context: Vec<String>,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ErrorRecord {
    /// Create a record at the point of failure.
    #[track_caller]
    pub fn new(code: ErrorCode, cause: impl Into<String>) -> Self {
        let origin = Location::caller();
        Self {
            code,
            cause: cause.into(),
            data: None,
            context: vec![format!("{}:{}", origin.file(), origin.line())],
            source: None,
        }
    }

    /// Keep the underlying error so callers can inspect it.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Attach a diagnostic payload (offending input, violation list, query...).
    ///
    /// Payloads that cannot be represented as JSON fall back to their debug form.
    pub fn with_data<T>(mut self, data: &T) -> Self
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        let value = serde_json::to_value(data)
            .unwrap_or_else(|_| JsonValue::String(format!("{data:?}")));
        self.data = Some(value);
        self
    }

    /// Append the caller's location and a short note to the context stack.
    #[track_caller]
    pub fn wrap(mut self, note: impl AsRef<str>) -> Self {
        let at = Location::caller();
        let note = note.as_ref();
        if note.is_empty() {
            self.context.push(format!("{}:{}", at.file(), at.line()));
        } else {
            self.context.push(format!("{}:{} {}", at.file(), at.line(), note));
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    pub fn data(&self) -> Option<&JsonValue> {
        self.data.as_ref()
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Violation messages carried by a `DomainProps` record (empty otherwise).
    pub fn violations(&self) -> Vec<&str> {
        match (&self.code, &self.data) {
            (ErrorCode::DomainProps, Some(JsonValue::Array(items))) => {
                items.iter().filter_map(|v| v.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}
