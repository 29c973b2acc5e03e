use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a [`crate::adapters::LedgerStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry not found: {0}")]
    NotFound(Uuid),
    #[error("duplicate external origin {origin_id} in project {project_id}")]
    DuplicateOrigin { project_id: Uuid, origin_id: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures raised while pulling candidate or ledger data for a sync.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source error: {0}")]
    Source(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("timed out after {waited_ms} ms")]
    TimedOut { waited_ms: u64 },
}

/// Failure while appending to the audit trail. Swallowed at the service
/// boundary; commit never fails on audit problems.
#[derive(Debug, Error)]
#[error("audit append failed: {0}")]
pub struct AuditError(pub String);

/// Which end of the pull failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Ledger,
    Candidates,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchSource::Ledger => write!(f, "ledger"),
            FetchSource::Candidates => write!(f, "candidate"),
        }
    }
}

impl std::error::Error for FetchSource {}

/// Errors surfaced by [`crate::engine::SyncService`]. Per-item apply
/// failures are reported inside [`crate::domain::ApplyOutcome`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a sync session is already open for project {0}")]
    SessionInProgress(Uuid),
    #[error("{source} fetch failed: {cause}")]
    Fetch {
        source: FetchSource,
        cause: FetchError,
    },
    #[error("store unavailable during apply: {0}")]
    StoreUnavailable(String),
}

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Interaction failed: {0}")]
    Interaction(#[from] dialoguer::Error),
}
