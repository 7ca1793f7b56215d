//! Job status entity and the validator that is the only way to build one.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::date::BusinessDate;
use crate::entity::Entity;
use crate::error::{ErrorCode, ErrorRecord, SloResult};

pub const MAX_APPLICATION_ID_LEN: usize = 200;
pub const MAX_JOB_ID_LEN: usize = 200;
pub const MAX_RUN_ID_LEN: usize = 50;
pub const MAX_HOST_ID_LEN: usize = 150;

/// Lifecycle event kind reported by a job runner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatusCode {
    Start,
    Succeed,
    Fail,
}

impl JobStatusCode {
    pub const ALL: [JobStatusCode; 3] = [
        JobStatusCode::Start,
        JobStatusCode::Succeed,
        JobStatusCode::Fail,
    ];

    /// Canonical (uppercase) form.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatusCode::Start => "START",
            JobStatusCode::Succeed => "SUCCEED",
            JobStatusCode::Fail => "FAIL",
        }
    }
}

impl fmt::Display for JobStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string is not one of the known status codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status code |{0}|")]
pub struct UnknownStatusCode(pub String);

impl FromStr for JobStatusCode {
    type Err = UnknownStatusCode;

    /// Case-insensitive match against the canonical codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatusCode(s.to_string()))
    }
}

/// Untrusted job status as decoded from the transport payload.
///
/// Nothing here has been checked yet; pass it to [`JobStatus::new`]. Absent or
/// `null` text fields decode as empty so the validator can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusDto {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub application_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub job_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub job_status_code: String,
    pub job_status_timestamp: DateTime<Utc>,
    pub business_date: BusinessDate,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub run_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub host_id: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Primary key as the storage sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobStatusKey {
    pub application_id: String,
    pub job_id: String,
    pub job_status_timestamp: DateTime<Utc>,
    pub business_date: BusinessDate,
}

/// A validated job status record.
///
/// Fields are private: the only constructors run the full rule set, so holding
/// a `JobStatus` means every rule passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    application_id: String,
    job_id: String,
    job_status_code: JobStatusCode,
    job_status_timestamp: DateTime<Utc>,
    business_date: BusinessDate,
    run_id: String,
    host_id: String,
}

impl JobStatus {
    /// Validate `dto` against the current instant.
    #[track_caller]
    pub fn new(dto: JobStatusDto) -> SloResult<Self> {
        Self::new_at(dto, Utc::now())
    }

    /// Validate `dto` as of `now`.
    ///
    /// Every rule is evaluated; on failure the record carries all violation
    /// messages in rule order and no entity is produced.
    #[track_caller]
    pub fn new_at(dto: JobStatusDto, now: DateTime<Utc>) -> SloResult<Self> {
        let (code, violations) = check(&dto, now);

        match code {
            Some(job_status_code) if violations.is_empty() => Ok(Self {
                application_id: dto.application_id,
                job_id: dto.job_id,
                job_status_code,
                job_status_timestamp: dto.job_status_timestamp.trunc_subsecs(3),
                business_date: dto.business_date,
                run_id: dto.run_id,
                host_id: dto.host_id,
            }),
            _ => Err(ErrorRecord::new(ErrorCode::DomainProps, "props error").with_data(&violations)),
        }
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn job_status_code(&self) -> JobStatusCode {
        self.job_status_code
    }

    pub fn job_status_timestamp(&self) -> DateTime<Utc> {
        self.job_status_timestamp
    }

    pub fn business_date(&self) -> BusinessDate {
        self.business_date
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn key(&self) -> JobStatusKey {
        self.id()
    }
}

impl Entity for JobStatus {
    type Id = JobStatusKey;

    fn id(&self) -> JobStatusKey {
        JobStatusKey {
            application_id: self.application_id.clone(),
            job_id: self.job_id.clone(),
            job_status_timestamp: self.job_status_timestamp,
            business_date: self.business_date,
        }
    }
}

impl From<&JobStatus> for JobStatusDto {
    fn from(js: &JobStatus) -> Self {
        Self {
            application_id: js.application_id.clone(),
            job_id: js.job_id.clone(),
            job_status_code: js.job_status_code.as_str().to_string(),
            job_status_timestamp: js.job_status_timestamp,
            business_date: js.business_date,
            run_id: js.run_id.clone(),
            host_id: js.host_id.clone(),
        }
    }
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Apply every rule; returns the parsed status code (if valid) and all violations.
fn check(dto: &JobStatusDto, now: DateTime<Utc>) -> (Option<JobStatusCode>, Vec<String>) {
    let mut violations = Vec::new();

    let app_len = dto.application_id.chars().count();
    if app_len == 0 || app_len > MAX_APPLICATION_ID_LEN {
        violations.push(format!("invalid ApplicationId |{}|", dto.application_id));
    }

    let job_len = dto.job_id.chars().count();
    if job_len == 0 || job_len > MAX_JOB_ID_LEN {
        violations.push(format!("invalid JobId |{}|", dto.job_id));
    }

    let code = dto.job_status_code.parse::<JobStatusCode>().ok();
    if code.is_none() {
        violations.push(format!("invalid JobStatusCode |{}|", dto.job_status_code));
    }

    if dto.job_status_timestamp > now {
        violations.push(format!(
            "invalid JobTimestamp |{}|",
            rfc3339(&dto.job_status_timestamp)
        ));
    }

    let business_start = dto.business_date.start_of_day();
    if business_start > now {
        violations.push(format!("invalid BusinessDate |{}|", dto.business_date));
    }

    // Date line zones are not special-cased: the business date is midnight UTC.
    if dto.job_status_timestamp < business_start {
        violations.push(format!(
            "JobTimestamp is less than BusinessDate |{}| |{}|",
            rfc3339(&dto.job_status_timestamp),
            dto.business_date
        ));
    }

    if dto.run_id.chars().count() > MAX_RUN_ID_LEN {
        violations.push(format!("RunId is over 50 characters |{}|", dto.run_id));
    }

    if dto.host_id.chars().count() > MAX_HOST_ID_LEN {
        violations.push(format!("HostId is over 150 characters |{}|", dto.host_id));
    }

    (code, violations)
}
