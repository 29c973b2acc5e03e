use serde::{Deserialize, Serialize};

use super::diff::{CategoryCounts, DiffCategory};

/// A single failed apply operation. The reference is the entry id for
/// modifications and deletions, and the reconcile key for additions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationFailure {
    pub category: DiffCategory,
    pub reference: String,
    pub message: String,
}

/// What the applier actually managed to do. Counts reflect successes only;
/// each failed item shows up in `failures` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub failures: Vec<OperationFailure>,
}

impl ApplyOutcome {
    pub fn applied_counts(&self) -> CategoryCounts {
        CategoryCounts {
            add: self.added,
            modify: self.modified,
            delete: self.deleted,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.added + self.modified + self.deleted
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
