//! Best-effort application of an approved diff subset.

use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use uuid::Uuid;

use crate::adapters::LedgerStore;
use crate::domain::{
    ApplyOutcome, DiffCategory, DiffResult, EntryOrigin, EntryPatch, EntryStatus, NewLedgerEntry,
    OperationFailure,
};
use crate::errors::{StoreError, SyncError};

/// Issues the create/update/delete operations for an approved subset.
///
/// Operations run independently per item: one failure is collected into the
/// outcome and the remaining items still execute. The only hard stop is the
/// store reporting itself unavailable, which aborts the batch as a whole.
pub struct Applier;

impl Applier {
    pub async fn apply(
        store: &dyn LedgerStore,
        project_id: Uuid,
        selected: &DiffResult,
        per_op_timeout: Duration,
    ) -> Result<ApplyOutcome, SyncError> {
        let mut outcome = ApplyOutcome::default();

        for candidate in &selected.to_add {
            let entry = NewLedgerEntry {
                project_id,
                kind: candidate.kind,
                category: candidate.category.clone(),
                description: candidate.description.clone(),
                amount: candidate.amount,
                posting_date: candidate.posting_date,
                origin: EntryOrigin::External,
                origin_id: Some(candidate.reconcile_key().to_string()),
                status: EntryStatus::Confirmed,
            };
            let result = run_op(per_op_timeout, store.insert(entry)).await.map(|_| ());
            record(
                &mut outcome,
                DiffCategory::Add,
                candidate.reconcile_key().to_string(),
                result,
            )?;
        }

        for item in &selected.to_modify {
            let mut patch = EntryPatch::default();
            for change in &item.changed_fields {
                change.write_into(&mut patch);
            }
            patch.updated_at = Some(Utc::now());
            let result = run_op(per_op_timeout, store.update_fields(item.target_id, patch)).await;
            record(
                &mut outcome,
                DiffCategory::Modify,
                item.target_id.to_string(),
                result,
            )?;
        }

        for entry in &selected.to_delete {
            let result = run_op(per_op_timeout, store.delete_by_id(entry.id)).await;
            record(
                &mut outcome,
                DiffCategory::Delete,
                entry.id.to_string(),
                result,
            )?;
        }

        tracing::info!(
            added = outcome.added,
            modified = outcome.modified,
            deleted = outcome.deleted,
            failed = outcome.failures.len(),
            %project_id,
            "apply finished"
        );
        Ok(outcome)
    }
}

async fn run_op<T, F>(per_op_timeout: Duration, op: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    match timeout(per_op_timeout, op).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "operation timed out after {} ms",
            per_op_timeout.as_millis()
        ))),
    }
}

/// Books one operation's result: bumps the success counter, collects the
/// failure, or aborts the batch when the store is unreachable.
fn record(
    outcome: &mut ApplyOutcome,
    category: DiffCategory,
    reference: String,
    result: Result<(), StoreError>,
) -> Result<(), SyncError> {
    match result {
        Ok(()) => {
            match category {
                DiffCategory::Add => outcome.added += 1,
                DiffCategory::Modify => outcome.modified += 1,
                DiffCategory::Delete => outcome.deleted += 1,
            }
            Ok(())
        }
        Err(StoreError::Unavailable(message)) => Err(SyncError::StoreUnavailable(message)),
        Err(err) => {
            tracing::warn!(?category, %reference, %err, "apply operation failed");
            outcome.failures.push(OperationFailure {
                category,
                reference,
                message: err.to_string(),
            });
            Ok(())
        }
    }
}
