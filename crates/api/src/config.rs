use std::net::SocketAddr;

use anyhow::{Context, Result};

use slo_infra::StorageConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9201";

/// Process configuration for the API binary.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
}

impl ApiConfig {
    /// Load from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("SLO_BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("SLO_BIND_ADDR must be host:port, got {raw_addr:?}"))?;

        Ok(Self {
            bind_addr,
            storage: StorageConfig::from_lookup(&lookup)?,
        })
    }
}
