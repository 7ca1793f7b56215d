//! Storage error classification.
//!
//! This is the only place that looks inside driver errors. Each backend's error
//! type implements [`StorageFault`], exposing a SQLSTATE-style code when it has
//! one, and [`classify`] maps that onto the shared taxonomy:
//!
//! | Native shape | ErrorCode |
//! |--------------|-----------|
//! | `23505` (unique violation) | `RepoDupeRow` |
//! | `08xxx` (connection exception class) | `RepoConnException` |
//! | transport failure with no code (I/O, pool exhausted/closed) | `RepoConnException` |
//! | any other code, or no code at all | `RepoOther` |

use std::borrow::Cow;
use std::fmt;

use slo_core::{ErrorCode, ErrorRecord};

use super::in_memory::InMemoryError;

pub const UNIQUE_VIOLATION: &str = "23505";
pub const CONNECTION_EXCEPTION_CLASS: &str = "08";

/// A backend error the classifier can inspect.
pub trait StorageFault: fmt::Display {
    /// SQLSTATE (or equivalent) reported by the driver, if any.
    fn sqlstate(&self) -> Option<Cow<'_, str>>;

    /// Transport-level failure that never reached the server.
    fn is_connection_failure(&self) -> bool {
        false
    }
}

pub fn classify<E>(err: &E) -> ErrorCode
where
    E: StorageFault + ?Sized,
{
    match err.sqlstate() {
        Some(code) if code == UNIQUE_VIOLATION => ErrorCode::RepoDupeRow,
        Some(code) if code.starts_with(CONNECTION_EXCEPTION_CLASS) => ErrorCode::RepoConnException,
        _ if err.is_connection_failure() => ErrorCode::RepoConnException,
        _ => ErrorCode::RepoOther,
    }
}

/// Classify `err` and wrap it in an [`ErrorRecord`] naming the failed operation.
///
/// The driver error becomes the record's `source()`.
#[track_caller]
pub fn storage_error<E>(operation: &str, err: E) -> ErrorRecord
where
    E: StorageFault + std::error::Error + Send + Sync + 'static,
{
    let code = classify(&err);
    let mut record = ErrorRecord::new(code, format!("{operation}: {err}"));
    if let Some(state) = err.sqlstate() {
        record = record.with_data(&serde_json::json!({ "sqlstate": state }));
    }
    record.with_source(err)
}

impl StorageFault for sqlx::Error {
    fn sqlstate(&self) -> Option<Cow<'_, str>> {
        match self {
            sqlx::Error::Database(db_err) => db_err.code(),
            _ => None,
        }
    }

    fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        )
    }
}

#[cfg(feature = "orm")]
impl StorageFault for diesel::result::Error {
    /// Diesel reports a kind rather than the raw SQLSTATE; map the kinds back.
    fn sqlstate(&self) -> Option<Cow<'_, str>> {
        use diesel::result::{DatabaseErrorKind, Error};

        let state = match self {
            Error::DatabaseError(kind, _) => match kind {
                DatabaseErrorKind::UniqueViolation => UNIQUE_VIOLATION,
                DatabaseErrorKind::ForeignKeyViolation => "23503",
                DatabaseErrorKind::NotNullViolation => "23502",
                DatabaseErrorKind::CheckViolation => "23514",
                DatabaseErrorKind::SerializationFailure => "40001",
                DatabaseErrorKind::ReadOnlyTransaction => "25006",
                DatabaseErrorKind::ClosedConnection => "08003",
                _ => return None,
            },
            _ => return None,
        };
        Some(Cow::Borrowed(state))
    }
}

#[cfg(feature = "orm")]
impl StorageFault for diesel::r2d2::PoolError {
    fn sqlstate(&self) -> Option<Cow<'_, str>> {
        None
    }

    fn is_connection_failure(&self) -> bool {
        true
    }
}

impl StorageFault for InMemoryError {
    fn sqlstate(&self) -> Option<Cow<'_, str>> {
        match self {
            InMemoryError::DuplicateKey(_) => Some(Cow::Borrowed(UNIQUE_VIOLATION)),
            InMemoryError::Poisoned => None,
        }
    }
}
