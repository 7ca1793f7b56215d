//! Query translation: free-form string parameters to storage predicates.
//!
//! [`translate`] turns caller-supplied `(name, value)` pairs into a
//! [`QueryPredicate`], parsing temporal fields on the way. A predicate can then
//! be rendered for a SQL backend ([`QueryPredicate::to_sql`]) or evaluated
//! directly against an entity ([`QueryPredicate::matches`]).
//!
//! Terms are combined with AND, in the order their names first appear in the
//! input. There is no OR.

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use crate::date::BusinessDate;
use crate::error::{ErrorCode, ErrorRecord, SloResult};
use crate::field::{FieldKind, JobStatusField};
use crate::job_status::JobStatus;

/// A query value already parsed for its field's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(BusinessDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub field: JobStatusField,
    pub value: QueryValue,
}

/// Ordered equality terms over `JobStatus` fields. Empty means "match all".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryPredicate {
    terms: Vec<QueryTerm>,
}

/// Parameterized SQL filter: `clause` uses `$1..$n` in the order of `args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub clause: String,
    pub args: Vec<QueryValue>,
}

impl SqlFilter {
    /// `" WHERE <clause>"`, or nothing when there are no terms.
    pub fn where_suffix(&self) -> String {
        if self.clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }
}

/// Translate raw query parameters into a predicate.
///
/// - names not in the field catalog are ignored
/// - empty values are ignored (nothing to compare against)
/// - a repeated name keeps its first value
/// - timestamps are RFC3339 and normalized to UTC milliseconds
/// - dates are `YYYY-MM-DD`
///
/// A value that fails to parse for its field aborts the whole translation with
/// `AppTermInvalid`.
pub fn translate<I, K, V>(query: I) -> SloResult<QueryPredicate>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for (name, raw) in query {
        let (name, raw) = (name.as_ref(), raw.as_ref());

        let Some(field) = JobStatusField::from_external(name) else {
            tracing::debug!(name, "ignoring unknown query field");
            continue;
        };
        if raw.is_empty() || !seen.insert(field) {
            continue;
        }

        let value = parse_value(field, raw)?;
        terms.push(QueryTerm { field, value });
    }

    Ok(QueryPredicate { terms })
}

fn parse_value(field: JobStatusField, raw: &str) -> SloResult<QueryValue> {
    let invalid = |detail: String| {
        ErrorRecord::new(
            ErrorCode::AppTermInvalid,
            format!("invalid {} |{raw}|: {detail}", field.external_name()),
        )
        .with_data(&serde_json::json!({ "field": field.external_name(), "value": raw }))
    };

    match field.kind() {
        FieldKind::Text => Ok(QueryValue::Text(raw.to_string())),
        FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
            .map(|ts| QueryValue::Timestamp(ts.with_timezone(&Utc).trunc_subsecs(3)))
            .map_err(|e| invalid(e.to_string())),
        FieldKind::Date => raw
            .parse::<BusinessDate>()
            .map(QueryValue::Date)
            .map_err(|e| invalid(e.to_string())),
    }
}

fn value_of(js: &JobStatus, field: JobStatusField) -> QueryValue {
    match field {
        JobStatusField::ApplicationId => QueryValue::Text(js.application_id().to_string()),
        JobStatusField::JobId => QueryValue::Text(js.job_id().to_string()),
        JobStatusField::JobStatusCode => QueryValue::Text(js.job_status_code().as_str().to_string()),
        JobStatusField::JobStatusTimestamp => QueryValue::Timestamp(js.job_status_timestamp()),
        JobStatusField::BusinessDate => QueryValue::Date(js.business_date()),
        JobStatusField::RunId => QueryValue::Text(js.run_id().to_string()),
        JobStatusField::HostId => QueryValue::Text(js.host_id().to_string()),
    }
}

impl QueryPredicate {
    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// In-memory evaluation: every term must equal the entity's field value.
    pub fn matches(&self, js: &JobStatus) -> bool {
        self.terms
            .iter()
            .all(|term| value_of(js, term.field) == term.value)
    }

    /// Render as a parameterized SQL fragment over quoted column names.
    pub fn to_sql(&self) -> SqlFilter {
        let mut clause = String::new();
        let mut args = Vec::with_capacity(self.terms.len());

        for (idx, term) in self.terms.iter().enumerate() {
            if idx > 0 {
                clause.push_str(" AND ");
            }
            let _ = write!(clause, "\"{}\" = ${}", term.field.column(), idx + 1);
            args.push(term.value.clone());
        }

        SqlFilter { clause, args }
    }
}
