//! Host-facing façade for the pull-compare-approve-apply cycle.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::time::timeout;
use uuid::Uuid;

use crate::adapters::{AuditLogger, CandidateProvider, LedgerStore};
use crate::config::SyncConfig;
use crate::domain::{
    ApplyOutcome, CandidateEntry, CategoryCounts, DiffResult, FieldChange, LedgerEntry,
    SyncLogEntry,
};
use crate::errors::{FetchError, FetchSource, SyncError};

use super::applier::Applier;
use super::diff_engine::diff;
use super::session::{ApprovalSession, SessionRegistry};

/// Drives sync sessions against a project ledger: fetches both sides,
/// computes the diff, and applies the operator-approved subset while
/// recording an audit trail.
///
/// One service instance is shared by the host; sessions themselves are value
/// objects handed back to the caller. Only one session may be open per
/// project at a time.
pub struct SyncService {
    store: Arc<dyn LedgerStore>,
    provider: Arc<dyn CandidateProvider>,
    audit: Arc<dyn AuditLogger>,
    config: SyncConfig,
    registry: Arc<SessionRegistry>,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        provider: Arc<dyn CandidateProvider>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self::with_config(store, provider, audit, SyncConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn LedgerStore>,
        provider: Arc<dyn CandidateProvider>,
        audit: Arc<dyn AuditLogger>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            provider,
            audit,
            config,
            registry: SessionRegistry::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fetches both sides and returns a reviewed-ready session, or refuses
    /// when the project already has one open. A fetch failure leaves no
    /// partial state behind; the slot is released and the error carries
    /// which source failed.
    pub async fn start_sync(
        &self,
        project_id: Uuid,
        actor: impl Into<String>,
    ) -> Result<ApprovalSession, SyncError> {
        let ticket = self
            .registry
            .acquire(project_id)
            .ok_or(SyncError::SessionInProgress(project_id))?;

        tracing::info!(%project_id, "sync fetch started");
        let existing = self.fetch_existing(project_id).await?;
        let candidates = self.fetch_candidates(project_id).await?;

        let result = diff(&existing, &candidates);
        let counts = result.counts();
        tracing::info!(
            %project_id,
            add = counts.add,
            modify = counts.modify,
            delete = counts.delete,
            "diff computed"
        );
        Ok(ApprovalSession::new(project_id, actor, result, ticket))
    }

    /// Applies the session's selected subset and records the audit entry.
    /// Per-item failures are reported inside the outcome; the commit itself
    /// only fails when the store is unreachable before the batch can run.
    pub async fn commit(&self, mut session: ApprovalSession) -> Result<ApplyOutcome, SyncError> {
        let project_id = session.project_id();
        let detected = session.diff().counts();
        let rejected = session.rejected_counts();
        let selected = session.selected_subset();
        session.begin_apply();

        let applied = Applier::apply(
            self.store.as_ref(),
            project_id,
            &selected,
            self.config.apply_timeout(),
        )
        .await;

        match applied {
            Ok(outcome) => {
                session.complete();
                self.record_audit(&session, detected, rejected, &selected, &outcome)
                    .await;
                Ok(outcome)
            }
            Err(err) => {
                session.fail();
                tracing::error!(%project_id, %err, "apply aborted");
                Err(err)
            }
        }
    }

    /// Discards the session without side effects; the project slot frees up
    /// when the session drops.
    pub fn cancel(&self, session: ApprovalSession) {
        tracing::info!(project_id = %session.project_id(), "sync session cancelled");
        drop(session);
    }

    async fn fetch_existing(&self, project_id: Uuid) -> Result<Vec<LedgerEntry>, SyncError> {
        let store = Arc::clone(&self.store);
        self.fetch_with_retry(FetchSource::Ledger, move || {
            let store = Arc::clone(&store);
            async move {
                store
                    .list_external_entries(project_id)
                    .await
                    .map_err(|err| FetchError::Source(err.to_string()))
            }
        })
        .await
    }

    async fn fetch_candidates(&self, project_id: Uuid) -> Result<Vec<CandidateEntry>, SyncError> {
        let provider = Arc::clone(&self.provider);
        self.fetch_with_retry(FetchSource::Candidates, move || {
            let provider = Arc::clone(&provider);
            async move { provider.fetch_candidates(project_id).await }
        })
        .await
    }

    /// Wraps a fetch in the configured timeout and retries it the configured
    /// number of times before giving up.
    async fn fetch_with_retry<T, F, Fut>(
        &self,
        source: FetchSource,
        fetch: F,
    ) -> Result<T, SyncError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, FetchError>>,
    {
        let limit = self.config.fetch_timeout();
        let mut attempt = 0u32;
        loop {
            let cause = match timeout(limit, fetch()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(_) => FetchError::TimedOut {
                    waited_ms: limit.as_millis() as u64,
                },
            };
            if attempt >= self.config.retry_attempts {
                return Err(SyncError::Fetch { source, cause });
            }
            attempt += 1;
            tracing::warn!(%source, %cause, attempt, "fetch failed, retrying");
        }
    }

    /// Builds and appends the audit record. Audit failures never unwind a
    /// completed sync; they are reduced to a warning.
    async fn record_audit(
        &self,
        session: &ApprovalSession,
        detected: CategoryCounts,
        rejected: CategoryCounts,
        selected: &DiffResult,
        outcome: &ApplyOutcome,
    ) {
        let entry = SyncLogEntry {
            timestamp: Utc::now(),
            actor: session.actor().to_string(),
            project_id: session.project_id(),
            detected,
            applied: outcome.applied_counts(),
            rejected,
            details: details_json(selected, outcome),
        };
        if let Err(err) = self.audit.append(entry).await {
            tracing::warn!(project_id = %session.project_id(), %err, "audit append failed");
        }
    }
}

fn details_json(selected: &DiffResult, outcome: &ApplyOutcome) -> serde_json::Value {
    json!({
        "added": selected
            .to_add
            .iter()
            .map(|candidate| candidate.reconcile_key())
            .collect::<Vec<_>>(),
        "modified": selected
            .to_modify
            .iter()
            .map(|item| json!({
                "id": item.target_id,
                "fields": item
                    .changed_fields
                    .iter()
                    .map(FieldChange::field)
                    .collect::<Vec<_>>(),
            }))
            .collect::<Vec<_>>(),
        "deleted": selected
            .to_delete
            .iter()
            .map(|entry| entry.id)
            .collect::<Vec<_>>(),
        "failures": outcome.failures,
    })
}
