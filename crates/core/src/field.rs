//! Static catalog of the queryable `JobStatus` fields.
//!
//! Maps the external (wire) name of each field to its storage column and the
//! semantic kind used to parse query values. The table is declared once here;
//! nothing is discovered at runtime.

use std::collections::HashMap;
use std::sync::LazyLock;

/// How a raw query value for a field is interpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Timestamp,
    Date,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum JobStatusField {
    ApplicationId,
    JobId,
    JobStatusCode,
    JobStatusTimestamp,
    BusinessDate,
    RunId,
    HostId,
}

struct FieldSpec {
    field: JobStatusField,
    external: &'static str,
    column: &'static str,
    kind: FieldKind,
}

static CATALOG: [FieldSpec; 7] = [
    FieldSpec {
        field: JobStatusField::ApplicationId,
        external: "applicationId",
        column: "ApplicationId",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: JobStatusField::JobId,
        external: "jobId",
        column: "JobId",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: JobStatusField::JobStatusCode,
        external: "jobStatusCode",
        column: "JobStatusCode",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: JobStatusField::JobStatusTimestamp,
        external: "jobStatusTimestamp",
        column: "JobStatusTimestamp",
        kind: FieldKind::Timestamp,
    },
    FieldSpec {
        field: JobStatusField::BusinessDate,
        external: "businessDate",
        column: "BusinessDate",
        kind: FieldKind::Date,
    },
    FieldSpec {
        field: JobStatusField::RunId,
        external: "runId",
        column: "RunId",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: JobStatusField::HostId,
        external: "hostId",
        column: "HostId",
        kind: FieldKind::Text,
    },
];

static BY_EXTERNAL_NAME: LazyLock<HashMap<&'static str, JobStatusField>> =
    LazyLock::new(|| CATALOG.iter().map(|spec| (spec.external, spec.field)).collect());

impl JobStatusField {
    pub const ALL: [JobStatusField; 7] = [
        JobStatusField::ApplicationId,
        JobStatusField::JobId,
        JobStatusField::JobStatusCode,
        JobStatusField::JobStatusTimestamp,
        JobStatusField::BusinessDate,
        JobStatusField::RunId,
        JobStatusField::HostId,
    ];

    /// Look up a field by its wire name (exact, case-sensitive).
    pub fn from_external(name: &str) -> Option<Self> {
        BY_EXTERNAL_NAME.get(name).copied()
    }

    fn spec(&self) -> &'static FieldSpec {
        // CATALOG is declared in the same order as the enum.
        &CATALOG[*self as usize]
    }

    pub fn external_name(&self) -> &'static str {
        self.spec().external
    }

    pub fn column(&self) -> &'static str {
        self.spec().column
    }

    pub fn kind(&self) -> FieldKind {
        self.spec().kind
    }
}
