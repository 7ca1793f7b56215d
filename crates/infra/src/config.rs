//! Storage configuration and repository selection.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `SLO_STORAGE` | `memory` | `memory`, `postgres` or `orm` |
//! | `DATABASE_URL` | unset | Postgres DSN (required by `postgres`/`orm`) |
//! | `SLO_DB_MAX_CONNECTIONS` | `10` | pool size |
//! | `SLO_DB_ACQUIRE_TIMEOUT_SECS` | `10` | wait for a pooled connection |
//! | `SLO_DB_ENSURE_SCHEMA` | `false` | create the `"JobStatus"` table on startup |

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use slo_core::{ErrorCode, ErrorRecord, SloResult};

use crate::repository::{InMemoryJobStatusRepo, JobStatusRepo, PostgresJobStatusRepo};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
    Orm,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "postgres" | "sql" => Ok(Self::Postgres),
            "orm" | "diesel" => Ok(Self::Orm),
            other => anyhow::bail!("unknown storage backend {other:?} (expected memory, postgres or orm)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub ensure_schema: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
            ensure_schema: false,
        }
    }
}

impl StorageConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset and empty values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend = match get("SLO_STORAGE") {
            Some(raw) => raw.parse::<StorageBackend>().context("SLO_STORAGE is invalid")?,
            None => defaults.backend,
        };
        let max_connections = match get("SLO_DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .context("SLO_DB_MAX_CONNECTIONS must be a positive number")?,
            None => defaults.max_connections,
        };
        anyhow::ensure!(max_connections > 0, "SLO_DB_MAX_CONNECTIONS must be a positive number");

        let acquire_timeout = match get("SLO_DB_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .context("SLO_DB_ACQUIRE_TIMEOUT_SECS must be a number of seconds")?,
            ),
            None => defaults.acquire_timeout,
        };
        let ensure_schema = match get("SLO_DB_ENSURE_SCHEMA") {
            Some(raw) => parse_flag(&raw).context("SLO_DB_ENSURE_SCHEMA must be true or false")?,
            None => defaults.ensure_schema,
        };

        Ok(Self {
            backend,
            database_url: get("DATABASE_URL"),
            max_connections,
            acquire_timeout,
            ensure_schema,
        })
    }

    /// The DSN, or `RepoNoDsn` when none was configured.
    pub fn require_database_url(&self) -> SloResult<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ErrorRecord::new(ErrorCode::RepoNoDsn, "DATABASE_URL is not set"))
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {other:?}"),
    }
}

/// Build the configured repository. Persistent backends connect eagerly.
pub async fn build_repo(config: &StorageConfig) -> SloResult<Arc<dyn JobStatusRepo>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryJobStatusRepo::new())),
        StorageBackend::Postgres => Ok(Arc::new(PostgresJobStatusRepo::connect(config).await?)),
        #[cfg(feature = "orm")]
        StorageBackend::Orm => Ok(Arc::new(
            crate::repository::OrmJobStatusRepo::connect(config).await?,
        )),
        #[cfg(not(feature = "orm"))]
        StorageBackend::Orm => Err(ErrorRecord::new(
            ErrorCode::RepoOther,
            "orm storage requested but slo-infra was built without the `orm` feature",
        )),
    }
}
