use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Revenue,
    Expense,
}

/// Provenance of a ledger entry. Only `External` entries participate in
/// reconciliation; manually captured entries are invisible to the diff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    External,
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Confirmed,
}

/// A persisted financial record scoped to a project.
///
/// Amounts are normalized to two decimal places by the caller before they
/// reach the engine; comparisons are exact, with no floating tolerance.
/// Invariant: entries with `origin == External` carry a `origin_id` that is
/// unique within their `project_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub project_id: Uuid,
    pub kind: EntryKind,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub posting_date: NaiveDate,
    pub origin: EntryOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn is_external(&self) -> bool {
        matches!(self.origin, EntryOrigin::External)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Insert shape handed to the store; ids and timestamps are assigned there.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLedgerEntry {
    pub project_id: Uuid,
    pub kind: EntryKind,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub posting_date: NaiveDate,
    pub origin: EntryOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
    pub status: EntryStatus,
}

impl NewLedgerEntry {
    /// Materializes the insert into a full entry with fresh id and timestamps.
    pub fn into_entry(self) -> LedgerEntry {
        let now = Utc::now();
        LedgerEntry {
            id: Uuid::new_v4(),
            project_id: self.project_id,
            kind: self.kind,
            category: self.category,
            description: self.description,
            amount: self.amount,
            posting_date: self.posting_date,
            origin: self.origin,
            origin_id: self.origin_id,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An entry derived from the external data source, not yet reconciled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateEntry {
    /// Stable identifier assigned by the external source itself.
    pub source_uid: String,
    /// Explicit reconciliation key; falls back to `source_uid` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
    pub kind: EntryKind,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub posting_date: NaiveDate,
}

impl CandidateEntry {
    /// The key this candidate is matched under.
    pub fn reconcile_key(&self) -> &str {
        self.origin_id.as_deref().unwrap_or(&self.source_uid)
    }
}

/// Partial update applied by the store; only the populated fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Copies the populated fields onto `entry`, leaving the rest untouched.
    pub fn apply_to(&self, entry: &mut LedgerEntry) {
        if let Some(description) = &self.description {
            entry.description = description.clone();
        }
        if let Some(amount) = self.amount {
            entry.amount = amount;
        }
        if let Some(posting_date) = self.posting_date {
            entry.posting_date = posting_date;
        }
        if let Some(category) = &self.category {
            entry.category = category.clone();
        }
        if let Some(kind) = self.kind {
            entry.kind = kind;
        }
        if let Some(updated_at) = self.updated_at {
            entry.updated_at = updated_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> LedgerEntry {
        NewLedgerEntry {
            project_id: Uuid::new_v4(),
            kind: EntryKind::Revenue,
            category: "medição".into(),
            description: "Medição 1".into(),
            amount: 1000.00,
            posting_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            origin: EntryOrigin::External,
            origin_id: Some("c1".into()),
            status: EntryStatus::Confirmed,
        }
        .into_entry()
    }

    #[test]
    fn reconcile_key_falls_back_to_source_uid() {
        let mut candidate = CandidateEntry {
            source_uid: "evt-9".into(),
            origin_id: None,
            kind: EntryKind::Expense,
            category: "material".into(),
            description: "Cimento".into(),
            amount: 250.00,
            posting_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        };
        assert_eq!(candidate.reconcile_key(), "evt-9");
        candidate.origin_id = Some("c7".into());
        assert_eq!(candidate.reconcile_key(), "c7");
    }

    #[test]
    fn patch_only_touches_populated_fields() {
        let mut entry = sample_entry();
        let original_description = entry.description.clone();
        let patch = EntryPatch {
            amount: Some(1200.00),
            ..EntryPatch::default()
        };
        patch.apply_to(&mut entry);
        assert_eq!(entry.amount, 1200.00);
        assert_eq!(entry.description, original_description);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(EntryPatch::default().is_empty());
        let patch = EntryPatch {
            category: Some("serviços".into()),
            ..EntryPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
