pub mod audit;
pub mod diff;
pub mod entry;
pub mod outcome;

pub use audit::SyncLogEntry;
pub use diff::{CategoryCounts, DiffCategory, DiffResult, FieldChange, ModifyItem};
pub use entry::{
    CandidateEntry, EntryKind, EntryOrigin, EntryPatch, EntryStatus, LedgerEntry, NewLedgerEntry,
};
pub use outcome::{ApplyOutcome, OperationFailure};

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use serde;
pub use uuid;
