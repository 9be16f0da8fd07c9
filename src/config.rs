use crate::driver::ConnectionOptions;
use crate::error::GatewayError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const CONFIG_PATH_VAR: &str = "METERGATE_CONFIG";
pub const MAX_CONCURRENCY_VAR: &str = "METERGATE_MAX_CONCURRENCY";
pub const CHANNEL_CAPACITY_VAR: &str = "METERGATE_CHANNEL_CAPACITY";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Gateway settings. Every field has a default, so a config file only needs the
/// keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Most driver sessions open at once across all batches.
    pub max_concurrency: usize,
    /// Buffer size of batch result streams.
    pub channel_capacity: usize,
    /// Used for requests that carry no connection options of their own.
    pub connection: ConnectionOptions,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            channel_capacity: 100,
            connection: ConnectionOptions::default(),
            log_filter: "info".into(),
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing gateway config YAML")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {:?}", path))
    }

    /// File named by `METERGATE_CONFIG` (defaults otherwise), then env overrides.
    pub fn from_env() -> Result<Self> {
        let base = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides looked up by variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup(MAX_CONCURRENCY_VAR) {
            self.max_concurrency = v
                .trim()
                .parse()
                .with_context(|| format!("{}={:?}", MAX_CONCURRENCY_VAR, v))?;
        }
        if let Some(v) = lookup(CHANNEL_CAPACITY_VAR) {
            self.channel_capacity = v
                .trim()
                .parse()
                .with_context(|| format!("{}={:?}", CHANNEL_CAPACITY_VAR, v))?;
        }
        if let Some(v) = lookup(LOG_LEVEL_VAR) {
            self.log_filter = v;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.max_concurrency == 0 {
            return Err(GatewayError::InvalidArgument(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(GatewayError::InvalidArgument(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
