use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{CandidateEntry, EntryKind, EntryPatch, LedgerEntry};
use chrono::NaiveDate;

/// The three reconciliation buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffCategory {
    Add,
    Modify,
    Delete,
}

/// One tracked-field difference between a matched pair. Only these five
/// fields can ever trigger a modification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldChange {
    Description { from: String, to: String },
    Amount { from: f64, to: f64 },
    PostingDate { from: NaiveDate, to: NaiveDate },
    Category { from: String, to: String },
    Kind { from: EntryKind, to: EntryKind },
}

impl FieldChange {
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Description { .. } => "description",
            FieldChange::Amount { .. } => "amount",
            FieldChange::PostingDate { .. } => "posting_date",
            FieldChange::Category { .. } => "category",
            FieldChange::Kind { .. } => "kind",
        }
    }

    /// Writes this change's target value into `patch`.
    pub fn write_into(&self, patch: &mut EntryPatch) {
        match self {
            FieldChange::Description { to, .. } => patch.description = Some(to.clone()),
            FieldChange::Amount { to, .. } => patch.amount = Some(*to),
            FieldChange::PostingDate { to, .. } => patch.posting_date = Some(*to),
            FieldChange::Category { to, .. } => patch.category = Some(to.clone()),
            FieldChange::Kind { to, .. } => patch.kind = Some(*to),
        }
    }
}

/// A matched pair whose tracked fields diverged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModifyItem {
    pub target_id: Uuid,
    pub before: LedgerEntry,
    pub after: CandidateEntry,
    pub changed_fields: Vec<FieldChange>,
}

/// Per-category item counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCounts {
    pub add: usize,
    pub modify: usize,
    pub delete: usize,
}

impl CategoryCounts {
    pub fn total(&self) -> usize {
        self.add + self.modify + self.delete
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Counts remaining after removing `other` from `self`.
    pub fn minus(&self, other: &CategoryCounts) -> CategoryCounts {
        CategoryCounts {
            add: self.add.saturating_sub(other.add),
            modify: self.modify.saturating_sub(other.modify),
            delete: self.delete.saturating_sub(other.delete),
        }
    }
}

/// The computed reconciliation between a project ledger and its candidates.
///
/// Additions and modifications keep candidate order; deletions keep the
/// existing-entry order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiffResult {
    pub to_add: Vec<CandidateEntry>,
    pub to_modify: Vec<ModifyItem>,
    pub to_delete: Vec<LedgerEntry>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_modify.is_empty() && self.to_delete.is_empty()
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            add: self.to_add.len(),
            modify: self.to_modify.len(),
            delete: self.to_delete.len(),
        }
    }

    pub fn len(&self, category: DiffCategory) -> usize {
        match category {
            DiffCategory::Add => self.to_add.len(),
            DiffCategory::Modify => self.to_modify.len(),
            DiffCategory::Delete => self.to_delete.len(),
        }
    }
}
