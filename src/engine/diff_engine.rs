//! Pure reconciliation diff between a project ledger and its candidates.

use std::collections::{HashMap, HashSet};

use crate::domain::{CandidateEntry, DiffResult, FieldChange, LedgerEntry, ModifyItem};

/// Computes the additions, modifications, and deletions needed to reconcile
/// `existing` with `candidates`. Deterministic and total: no I/O, no failure
/// path.
///
/// Matching is keyed on `origin_id`, considering only entries with
/// `origin == External`; manually captured entries are invisible here and can
/// never be deleted. A matched pair produces a [`ModifyItem`] only when one
/// of the tracked fields (description, amount, posting date, category, kind)
/// differs under strict equality. Additions and modifications come out in
/// candidate order, deletions in existing-entry order.
pub fn diff(existing: &[LedgerEntry], candidates: &[CandidateEntry]) -> DiffResult {
    let mut by_origin: HashMap<&str, &LedgerEntry> = HashMap::new();
    for entry in existing.iter().filter(|entry| entry.is_external()) {
        if let Some(key) = entry.origin_id.as_deref() {
            // First entry wins should the uniqueness invariant be violated.
            by_origin.entry(key).or_insert(entry);
        }
    }

    let mut matched_keys: HashSet<&str> = HashSet::new();
    let mut to_add = Vec::new();
    let mut to_modify = Vec::new();

    for candidate in candidates {
        let key = candidate.reconcile_key();
        match by_origin.remove(key) {
            Some(entry) => {
                matched_keys.insert(key);
                let changed_fields = tracked_changes(entry, candidate);
                if !changed_fields.is_empty() {
                    to_modify.push(ModifyItem {
                        target_id: entry.id,
                        before: entry.clone(),
                        after: candidate.clone(),
                        changed_fields,
                    });
                }
            }
            // Unmatched key, or a duplicate candidate key whose first
            // occurrence already accounted for the ledger entry.
            None => to_add.push(candidate.clone()),
        }
    }

    let to_delete = existing
        .iter()
        .filter(|entry| entry.is_external())
        .filter(|entry| {
            entry
                .origin_id
                .as_deref()
                .is_some_and(|key| !matched_keys.contains(key))
        })
        .cloned()
        .collect();

    DiffResult {
        to_add,
        to_modify,
        to_delete,
    }
}

/// Compares the tracked fields of a matched pair, listing exactly the ones
/// that differ. Amount comparison is exact; callers normalize amounts to two
/// decimal places upstream.
fn tracked_changes(before: &LedgerEntry, after: &CandidateEntry) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if before.description != after.description {
        changes.push(FieldChange::Description {
            from: before.description.clone(),
            to: after.description.clone(),
        });
    }
    if before.amount != after.amount {
        changes.push(FieldChange::Amount {
            from: before.amount,
            to: after.amount,
        });
    }
    if before.posting_date != after.posting_date {
        changes.push(FieldChange::PostingDate {
            from: before.posting_date,
            to: after.posting_date,
        });
    }
    if before.category != after.category {
        changes.push(FieldChange::Category {
            from: before.category.clone(),
            to: after.category.clone(),
        });
    }
    if before.kind != after.kind {
        changes.push(FieldChange::Kind {
            from: before.kind,
            to: after.kind,
        });
    }
    changes
}
