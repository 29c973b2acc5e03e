use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::utils::{config_file_in, ensure_dir, write_atomic};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_APPLY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

/// Timeout and retry policy for the I/O edges of a sync cycle. The engine
/// itself imposes no policy beyond this; hosts tune it per deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default = "SyncConfig::default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "SyncConfig::default_apply_timeout_ms")]
    pub apply_timeout_ms: u64,
    /// Additional attempts after a failed fetch. Apply operations are never
    /// retried; store writes are not known to be idempotent.
    #[serde(default = "SyncConfig::default_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            apply_timeout_ms: DEFAULT_APPLY_TIMEOUT_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl SyncConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.apply_timeout_ms)
    }

    fn default_fetch_timeout_ms() -> u64 {
        DEFAULT_FETCH_TIMEOUT_MS
    }

    fn default_apply_timeout_ms() -> u64 {
        DEFAULT_APPLY_TIMEOUT_MS
    }

    fn default_retry_attempts() -> u32 {
        DEFAULT_RETRY_ATTEMPTS
    }
}

/// Loads and saves the sync configuration under a data directory.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(base: &Path) -> Self {
        Self {
            path: config_file_in(base),
        }
    }

    pub fn load(&self) -> Result<SyncConfig, StoreError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(SyncConfig::default())
        }
    }

    pub fn save(&self, config: &SyncConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }
}
