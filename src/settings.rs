use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::backoff::{MAX_RETRIES, THIRTY_DAYS_SECS};
use crate::keys::DEFAULT_PREFIX;

/// Guard configuration. Every field has a default matching the pinned
/// deployment values; a TOML file may override any of them.
#[derive(Debug, Deserialize, Clone)]
pub struct GuardConfig {
    /// Namespace prepended to every lock and counter key. Several guards can
    /// share one store under different prefixes.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Lock expiry in seconds. A safety net against a crashed holder leaking
    /// its lock, not the expected hold duration.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    /// Reschedule budget per WorkIdentity conflict chain.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_key_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_lock_ttl_secs() -> u64 {
    THIRTY_DAYS_SECS
}

fn default_max_retries() -> u32 {
    MAX_RETRIES
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            lock_ttl_secs: default_lock_ttl_secs(),
            max_retries: default_max_retries(),
            log_format: LogFormat::default(),
        }
    }
}

impl GuardConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let data = fs::read_to_string(p)?;
                let cfg: Self = toml::from_str(&data)?;
                Ok(cfg)
            }
            None => Ok(Self::default()),
        }
    }
}
