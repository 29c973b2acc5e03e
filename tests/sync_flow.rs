use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use recon_core::adapters::{AuditLogger, CandidateProvider, LedgerStore};
use recon_core::audit::MemoryAuditLog;
use recon_core::config::SyncConfig;
use recon_core::domain::{
    CandidateEntry, DiffCategory, EntryKind, EntryOrigin, EntryPatch, EntryStatus, LedgerEntry,
    NewLedgerEntry, SyncLogEntry,
};
use recon_core::engine::SyncService;
use recon_core::errors::{AuditError, FetchError, FetchSource, StoreError, SyncError};
use recon_core::storage::MemoryLedgerStore;

/// Candidate provider serving a fixed list.
struct StaticCandidates {
    list: Vec<CandidateEntry>,
}

#[async_trait]
impl CandidateProvider for StaticCandidates {
    async fn fetch_candidates(&self, _project_id: Uuid) -> Result<Vec<CandidateEntry>, FetchError> {
        Ok(self.list.clone())
    }
}

/// Provider that fails `failures` times before succeeding.
struct FlakyCandidates {
    list: Vec<CandidateEntry>,
    failures: Mutex<u32>,
}

#[async_trait]
impl CandidateProvider for FlakyCandidates {
    async fn fetch_candidates(&self, _project_id: Uuid) -> Result<Vec<CandidateEntry>, FetchError> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(FetchError::Source("calendar unreachable".into()));
        }
        Ok(self.list.clone())
    }
}

/// Audit sink that always fails.
struct BrokenAudit;

#[async_trait]
impl AuditLogger for BrokenAudit {
    async fn append(&self, _entry: SyncLogEntry) -> Result<(), AuditError> {
        Err(AuditError("disk full".into()))
    }
}

/// Store whose reads work but whose writes report an outage.
struct ReadOnlyStore {
    inner: MemoryLedgerStore,
}

#[async_trait]
impl LedgerStore for ReadOnlyStore {
    async fn list_external_entries(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.list_external_entries(project_id).await
    }

    async fn insert(&self, _entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        Err(StoreError::Unavailable("write replica down".into()))
    }

    async fn update_fields(&self, _id: Uuid, _patch: EntryPatch) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("write replica down".into()))
    }

    async fn delete_by_id(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("write replica down".into()))
    }
}

fn candidate(key: &str, amount: f64) -> CandidateEntry {
    CandidateEntry {
        source_uid: format!("evt-{key}"),
        origin_id: Some(key.into()),
        kind: EntryKind::Revenue,
        category: "medição".into(),
        description: format!("Medição {key}"),
        amount,
        posting_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
    }
}

fn new_external(project_id: Uuid, key: &str, amount: f64) -> NewLedgerEntry {
    NewLedgerEntry {
        project_id,
        kind: EntryKind::Revenue,
        category: "medição".into(),
        description: format!("Medição {key}"),
        amount,
        posting_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        origin: EntryOrigin::External,
        origin_id: Some(key.into()),
        status: EntryStatus::Confirmed,
    }
}

fn service_with(
    store: Arc<MemoryLedgerStore>,
    audit: Arc<MemoryAuditLog>,
    candidates: Vec<CandidateEntry>,
) -> SyncService {
    SyncService::new(store, Arc::new(StaticCandidates { list: candidates }), audit)
}

#[tokio::test]
async fn full_cycle_adds_candidate_and_is_idempotent() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    let service = service_with(
        Arc::clone(&store),
        Arc::clone(&audit),
        vec![candidate("c1", 1000.00)],
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert_eq!(session.diff().counts().add, 1);
    assert!(session.diff().to_modify.is_empty());
    assert!(session.diff().to_delete.is_empty());

    let outcome = service.commit(session).await.unwrap();
    assert_eq!(outcome.added, 1);
    assert!(outcome.is_clean());

    let stored = store.snapshot(project_id);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].origin, EntryOrigin::External);
    assert_eq!(stored[0].origin_id.as_deref(), Some("c1"));
    assert_eq!(stored[0].status, EntryStatus::Confirmed);

    // A second pull over the updated ledger finds nothing to reconcile.
    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert!(session.diff().is_empty());
    service.cancel(session);

    let log = audit.entries();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].detected.add, 1);
    assert_eq!(log[0].applied.add, 1);
    assert!(log[0].rejected.is_zero());
    assert_eq!(log[0].actor, "tester");
}

#[tokio::test]
async fn amount_change_updates_only_listed_fields() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    store
        .insert(new_external(project_id, "c1", 1000.00))
        .await
        .unwrap();
    let service = service_with(
        Arc::clone(&store),
        Arc::clone(&audit),
        vec![candidate("c1", 1200.00)],
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert_eq!(session.diff().counts().modify, 1);
    let item = &session.diff().to_modify[0];
    assert_eq!(item.changed_fields.len(), 1);
    assert_eq!(item.changed_fields[0].field(), "amount");

    let before = store.snapshot(project_id)[0].clone();
    let outcome = service.commit(session).await.unwrap();
    assert_eq!(outcome.modified, 1);

    let after = store.snapshot(project_id)[0].clone();
    assert_eq!(after.amount, 1200.00);
    assert_eq!(after.description, before.description);
    assert_eq!(after.posting_date, before.posting_date);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn vanished_candidate_deletes_entry_but_never_manual_ones() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    store
        .insert(new_external(project_id, "c2", 500.00))
        .await
        .unwrap();
    let mut manual = new_external(project_id, "unused", 75.50);
    manual.origin = EntryOrigin::Manual;
    manual.origin_id = None;
    store.insert(manual).await.unwrap();

    let service = service_with(Arc::clone(&store), Arc::clone(&audit), Vec::new());
    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert_eq!(session.diff().counts().delete, 1);
    assert_eq!(session.diff().to_delete[0].origin_id.as_deref(), Some("c2"));

    let outcome = service.commit(session).await.unwrap();
    assert_eq!(outcome.deleted, 1);

    let remaining = store.snapshot(project_id);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].origin, EntryOrigin::Manual);
}

#[tokio::test]
async fn rejected_items_are_left_alone_and_counted() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    let service = service_with(
        Arc::clone(&store),
        Arc::clone(&audit),
        vec![candidate("c1", 1000.00), candidate("c2", 2000.00)],
    );

    let mut session = service.start_sync(project_id, "tester").await.unwrap();
    session.set_selected(DiffCategory::Add, 1, false);
    let outcome = service.commit(session).await.unwrap();
    assert_eq!(outcome.added, 1);

    let stored = store.snapshot(project_id);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].origin_id.as_deref(), Some("c1"));

    let log = audit.entries();
    assert_eq!(log[0].detected.add, 2);
    assert_eq!(log[0].applied.add, 1);
    assert_eq!(log[0].rejected.add, 1);

    // The rejected candidate is still pending on the next pull.
    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert_eq!(session.diff().counts().add, 1);
    assert_eq!(session.diff().to_add[0].reconcile_key(), "c2");
    service.cancel(session);
}

#[tokio::test]
async fn one_failing_item_does_not_block_the_rest() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    // Two candidates share a reconcile key: the second insert violates the
    // store's uniqueness invariant and must fail alone.
    let service = service_with(
        Arc::clone(&store),
        Arc::clone(&audit),
        vec![
            candidate("c1", 1000.00),
            candidate("c1", 1500.00),
            candidate("c3", 300.00),
        ],
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert_eq!(session.diff().counts().add, 3);
    let outcome = service.commit(session).await.unwrap();
    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].category, DiffCategory::Add);
    assert_eq!(outcome.failures[0].reference, "c1");

    let log = audit.entries();
    assert_eq!(log[0].applied.add, 2);
}

#[tokio::test]
async fn second_session_for_same_project_is_refused() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    let service = service_with(Arc::clone(&store), Arc::clone(&audit), Vec::new());

    let open = service.start_sync(project_id, "first").await.unwrap();
    let refused = service.start_sync(project_id, "second").await;
    assert!(matches!(refused, Err(SyncError::SessionInProgress(id)) if id == project_id));

    // Other projects are unaffected.
    let other = service.start_sync(Uuid::new_v4(), "second").await.unwrap();
    service.cancel(other);

    service.cancel(open);
    let reopened = service.start_sync(project_id, "third").await.unwrap();
    service.cancel(reopened);
}

#[tokio::test]
async fn fetch_failure_surfaces_and_releases_the_slot() {
    let store = Arc::new(MemoryLedgerStore::new());
    let project_id = Uuid::new_v4();
    let service = SyncService::with_config(
        store.clone(),
        Arc::new(FlakyCandidates {
            list: Vec::new(),
            failures: Mutex::new(u32::MAX),
        }),
        Arc::new(MemoryAuditLog::new()),
        SyncConfig {
            retry_attempts: 0,
            ..SyncConfig::default()
        },
    );

    let err = service.start_sync(project_id, "tester").await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Fetch {
            source: FetchSource::Candidates,
            ..
        }
    ));

    // The failure released the slot: the next attempt fails on fetch again,
    // not on an open session.
    let err = service.start_sync(project_id, "tester").await.unwrap_err();
    assert!(!matches!(err, SyncError::SessionInProgress(_)));
}

#[tokio::test]
async fn fetch_is_retried_per_policy() {
    let store = Arc::new(MemoryLedgerStore::new());
    let project_id = Uuid::new_v4();
    let service = SyncService::with_config(
        store,
        Arc::new(FlakyCandidates {
            list: vec![candidate("c1", 1000.00)],
            failures: Mutex::new(1),
        }),
        Arc::new(MemoryAuditLog::new()),
        SyncConfig::default(),
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    assert_eq!(session.diff().counts().add, 1);
    service.cancel(session);
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_commit() {
    let store = Arc::new(MemoryLedgerStore::new());
    let project_id = Uuid::new_v4();
    let service = SyncService::new(
        store.clone(),
        Arc::new(StaticCandidates {
            list: vec![candidate("c1", 1000.00)],
        }),
        Arc::new(BrokenAudit),
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    let outcome = service.commit(session).await.unwrap();
    assert_eq!(outcome.added, 1);
    assert_eq!(store.snapshot(project_id).len(), 1);
}

#[tokio::test]
async fn unreachable_store_aborts_the_apply() {
    let project_id = Uuid::new_v4();
    let service = SyncService::new(
        Arc::new(ReadOnlyStore {
            inner: MemoryLedgerStore::new(),
        }),
        Arc::new(StaticCandidates {
            list: vec![candidate("c1", 1000.00)],
        }),
        Arc::new(MemoryAuditLog::new()),
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    let err = service.commit(session).await.unwrap_err();
    assert!(matches!(err, SyncError::StoreUnavailable(_)));
}

#[tokio::test]
async fn cancel_discards_without_side_effects() {
    let store = Arc::new(MemoryLedgerStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let project_id = Uuid::new_v4();
    let service = service_with(
        Arc::clone(&store),
        Arc::clone(&audit),
        vec![candidate("c1", 1000.00)],
    );

    let session = service.start_sync(project_id, "tester").await.unwrap();
    service.cancel(session);

    assert!(store.snapshot(project_id).is_empty());
    assert!(audit.entries().is_empty());
}
