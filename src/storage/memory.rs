use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::adapters::LedgerStore;
use crate::domain::{EntryPatch, LedgerEntry, NewLedgerEntry};
use crate::errors::StoreError;

/// In-memory ledger store for tests and embedding hosts.
///
/// Enforces the same `(project_id, origin_id)` uniqueness invariant as the
/// persistent backends.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: Mutex<HashMap<Uuid, Vec<LedgerEntry>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full snapshot of one project's entries, manual ones included.
    pub fn snapshot(&self, project_id: Uuid) -> Vec<LedgerEntry> {
        self.entries
            .lock()
            .expect("memory store poisoned")
            .get(&project_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn list_external_entries(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .snapshot(project_id)
            .into_iter()
            .filter(LedgerEntry::is_external)
            .collect())
    }

    async fn insert(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let mut entries = self.entries.lock().expect("memory store poisoned");
        let project = entries.entry(entry.project_id).or_default();
        if let Some(origin_id) = entry.origin_id.as_deref() {
            let duplicate = project
                .iter()
                .any(|existing| existing.is_external() && existing.origin_id.as_deref() == Some(origin_id));
            if entry.origin == crate::domain::EntryOrigin::External && duplicate {
                return Err(StoreError::DuplicateOrigin {
                    project_id: entry.project_id,
                    origin_id: origin_id.to_string(),
                });
            }
        }
        let stored = entry.into_entry();
        project.push(stored.clone());
        Ok(stored)
    }

    async fn update_fields(&self, id: Uuid, patch: EntryPatch) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("memory store poisoned");
        for project in entries.values_mut() {
            if let Some(entry) = project.iter_mut().find(|entry| entry.id == id) {
                patch.apply_to(entry);
                return Ok(());
            }
        }
        Err(StoreError::NotFound(id))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("memory store poisoned");
        for project in entries.values_mut() {
            if let Some(index) = project.iter().position(|entry| entry.id == id) {
                project.remove(index);
                return Ok(());
            }
        }
        Err(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryKind, EntryOrigin, EntryStatus};
    use chrono::NaiveDate;

    fn new_entry(project_id: Uuid, origin_id: &str) -> NewLedgerEntry {
        NewLedgerEntry {
            project_id,
            kind: EntryKind::Revenue,
            category: "medição".into(),
            description: "Medição 1".into(),
            amount: 1000.00,
            posting_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            origin: EntryOrigin::External,
            origin_id: Some(origin_id.into()),
            status: EntryStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn insert_and_list_round_trip() {
        let store = MemoryLedgerStore::new();
        let project_id = Uuid::new_v4();
        store.insert(new_entry(project_id, "c1")).await.unwrap();
        let listed = store.list_external_entries(project_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].origin_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn duplicate_external_origin_is_rejected() {
        let store = MemoryLedgerStore::new();
        let project_id = Uuid::new_v4();
        store.insert(new_entry(project_id, "c1")).await.unwrap();
        let err = store
            .insert(new_entry(project_id, "c1"))
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, StoreError::DuplicateOrigin { .. }));
    }

    #[tokio::test]
    async fn manual_entries_stay_out_of_external_listing() {
        let store = MemoryLedgerStore::new();
        let project_id = Uuid::new_v4();
        let mut manual = new_entry(project_id, "ignored");
        manual.origin = EntryOrigin::Manual;
        manual.origin_id = None;
        store.insert(manual).await.unwrap();
        assert!(store.list_external_entries(project_id).await.unwrap().is_empty());
        assert_eq!(store.snapshot(project_id).len(), 1);
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found() {
        let store = MemoryLedgerStore::new();
        let err = store
            .update_fields(Uuid::new_v4(), EntryPatch::default())
            .await
            .expect_err("unknown id must fail");
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
