use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diff::CategoryCounts;

/// Append-only record of one completed sync: what was detected, what the
/// operator let through, and what the store accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncLogEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub project_id: Uuid,
    pub detected: CategoryCounts,
    pub applied: CategoryCounts,
    pub rejected: CategoryCounts,
    /// Per-item breakdown: added keys, modified field names, failure messages.
    #[serde(default)]
    pub details: serde_json::Value,
}
