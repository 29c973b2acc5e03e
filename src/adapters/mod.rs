//! Trait seams the engine consumes. Hosts plug their own store, candidate
//! source, and audit sink; the crate ships reference implementations under
//! [`crate::storage`] and [`crate::audit`].

pub mod candidates;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CandidateEntry, EntryPatch, LedgerEntry, NewLedgerEntry, SyncLogEntry};
use crate::errors::{AuditError, FetchError, StoreError};

/// Abstraction over the persisted project ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All externally sourced entries for the project. Manual entries are
    /// not part of the reconciliation surface and are never returned here.
    async fn list_external_entries(&self, project_id: Uuid) -> Result<Vec<LedgerEntry>, StoreError>;

    async fn insert(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError>;

    /// Applies `patch` to the entry identified by `id`; untouched fields keep
    /// their values.
    async fn update_fields(&self, id: Uuid, patch: EntryPatch) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Supplies the external-source candidate entries for a project.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn fetch_candidates(&self, project_id: Uuid) -> Result<Vec<CandidateEntry>, FetchError>;
}

/// Records sync outcomes. Best-effort: the engine logs and continues when an
/// append fails.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), AuditError>;
}

pub use candidates::JsonCandidateFile;
