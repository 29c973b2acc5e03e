//! Shipped [`AuditLogger`] implementations: an in-memory sink for tests and
//! an append-only JSON-lines file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapters::AuditLogger;
use crate::domain::SyncLogEntry;
use crate::errors::AuditError;
use crate::utils::{audit_file_in, ensure_dir};

/// Collects log entries in memory. Used by tests and hosts that forward the
/// trail elsewhere.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<SyncLogEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SyncLogEntry> {
        self.entries.lock().expect("audit log poisoned").clone()
    }
}

#[async_trait]
impl AuditLogger for MemoryAuditLog {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .map_err(|_| AuditError("audit log poisoned".into()))?
            .push(entry);
        Ok(())
    }
}

/// Append-only audit trail as one JSON document per line.
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    /// Opens the log under the data directory `base`.
    pub fn new(base: &Path) -> Result<Self, AuditError> {
        ensure_dir(base).map_err(|err| AuditError(err.to_string()))?;
        Ok(Self {
            path: audit_file_in(base),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the full trail back, skipping lines that fail to parse.
    pub fn read_all(&self) -> Result<Vec<SyncLogEntry>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path).map_err(|err| AuditError(err.to_string()))?;
        Ok(data
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[async_trait]
impl AuditLogger for JsonlAuditLog {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), AuditError> {
        let line = serde_json::to_string(&entry).map_err(|err| AuditError(err.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| AuditError(err.to_string()))?;
        writeln!(file, "{line}").map_err(|err| AuditError(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CategoryCounts;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_entry() -> SyncLogEntry {
        SyncLogEntry {
            timestamp: Utc::now(),
            actor: "tester".into(),
            project_id: Uuid::new_v4(),
            detected: CategoryCounts {
                add: 1,
                modify: 0,
                delete: 0,
            },
            applied: CategoryCounts {
                add: 1,
                modify: 0,
                delete: 0,
            },
            rejected: CategoryCounts::default(),
            details: serde_json::json!({"added": ["c1"]}),
        }
    }

    #[tokio::test]
    async fn jsonl_log_appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path()).unwrap();
        log.append(sample_entry()).await.unwrap();
        log.append(sample_entry()).await.unwrap();
        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].actor, "tester");
    }

    #[tokio::test]
    async fn memory_log_records_entries() {
        let log = MemoryAuditLog::new();
        log.append(sample_entry()).await.unwrap();
        assert_eq!(log.entries().len(), 1);
    }
}
