//! Operator approval state for one sync cycle.
//!
//! The session is a plain value object: it owns the computed diff, the
//! checkbox state for each item, and the per-project exclusivity ticket.
//! Rendering layers only read and write the selection through this API.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CategoryCounts, DiffCategory, DiffResult};

/// Lifecycle of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Fetching,
    Diffed,
    Applying,
    Completed,
    Failed,
}

/// Tracks which projects currently have an open session. A second
/// `start_sync` for the same project is refused until the first session
/// commits, cancels, or is dropped.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<HashSet<Uuid>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims the project slot, or returns `None` when a session is already
    /// open for it.
    pub fn acquire(self: &Arc<Self>, project_id: Uuid) -> Option<SessionTicket> {
        let mut active = self.active.lock().expect("session registry poisoned");
        if !active.insert(project_id) {
            return None;
        }
        Some(SessionTicket {
            registry: Arc::clone(self),
            project_id,
        })
    }

    pub fn is_active(&self, project_id: Uuid) -> bool {
        self.active
            .lock()
            .expect("session registry poisoned")
            .contains(&project_id)
    }

    fn release(&self, project_id: Uuid) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&project_id);
        }
    }
}

/// RAII claim on a project's sync slot; releases the slot when dropped.
#[derive(Debug)]
pub struct SessionTicket {
    registry: Arc<SessionRegistry>,
    project_id: Uuid,
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        self.registry.release(self.project_id);
    }
}

/// Checkbox state for every diff item, defaulting to all-selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSelection {
    add: Vec<bool>,
    modify: Vec<bool>,
    delete: Vec<bool>,
}

impl ApprovalSelection {
    pub fn all_selected(counts: CategoryCounts) -> Self {
        Self {
            add: vec![true; counts.add],
            modify: vec![true; counts.modify],
            delete: vec![true; counts.delete],
        }
    }

    fn flags(&self, category: DiffCategory) -> &[bool] {
        match category {
            DiffCategory::Add => &self.add,
            DiffCategory::Modify => &self.modify,
            DiffCategory::Delete => &self.delete,
        }
    }

    fn flags_mut(&mut self, category: DiffCategory) -> &mut Vec<bool> {
        match category {
            DiffCategory::Add => &mut self.add,
            DiffCategory::Modify => &mut self.modify,
            DiffCategory::Delete => &mut self.delete,
        }
    }

    /// Flips one item's flag. Out-of-range indices are ignored; selection
    /// mutators are total.
    pub fn toggle(&mut self, category: DiffCategory, index: usize) {
        if let Some(flag) = self.flags_mut(category).get_mut(index) {
            *flag = !*flag;
        }
    }

    /// Sets one item's flag to an absolute value.
    pub fn set(&mut self, category: DiffCategory, index: usize, value: bool) {
        if let Some(flag) = self.flags_mut(category).get_mut(index) {
            *flag = value;
        }
    }

    /// Bulk-sets every flag in a category.
    pub fn set_all(&mut self, category: DiffCategory, value: bool) {
        for flag in self.flags_mut(category).iter_mut() {
            *flag = value;
        }
    }

    pub fn is_selected(&self, category: DiffCategory, index: usize) -> bool {
        self.flags(category).get(index).copied().unwrap_or(false)
    }

    pub fn selected_counts(&self) -> CategoryCounts {
        CategoryCounts {
            add: self.add.iter().filter(|flag| **flag).count(),
            modify: self.modify.iter().filter(|flag| **flag).count(),
            delete: self.delete.iter().filter(|flag| **flag).count(),
        }
    }
}

/// One sync cycle under operator review: the diff, its selection, and the
/// session lifecycle state. Constructed by
/// [`crate::engine::SyncService::start_sync`] and consumed by `commit` or
/// `cancel`; dropping it releases the project slot either way.
#[derive(Debug)]
pub struct ApprovalSession {
    project_id: Uuid,
    actor: String,
    diff: DiffResult,
    selection: ApprovalSelection,
    state: SessionState,
    #[allow(dead_code)]
    ticket: SessionTicket,
}

impl ApprovalSession {
    pub fn new(project_id: Uuid, actor: impl Into<String>, diff: DiffResult, ticket: SessionTicket) -> Self {
        let selection = ApprovalSelection::all_selected(diff.counts());
        Self {
            project_id,
            actor: actor.into(),
            diff,
            selection,
            state: SessionState::Diffed,
            ticket,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn diff(&self) -> &DiffResult {
        &self.diff
    }

    pub fn selection(&self) -> &ApprovalSelection {
        &self.selection
    }

    pub fn toggle(&mut self, category: DiffCategory, index: usize) {
        self.selection.toggle(category, index);
    }

    pub fn set_selected(&mut self, category: DiffCategory, index: usize, value: bool) {
        self.selection.set(category, index, value);
    }

    pub fn select_all(&mut self, category: DiffCategory, value: bool) {
        self.selection.set_all(category, value);
    }

    pub fn is_selected(&self, category: DiffCategory, index: usize) -> bool {
        self.selection.is_selected(category, index)
    }

    pub fn selected_counts(&self) -> CategoryCounts {
        self.selection.selected_counts()
    }

    pub fn rejected_counts(&self) -> CategoryCounts {
        self.diff.counts().minus(&self.selected_counts())
    }

    /// Clones the selected items into a standalone diff, leaving the
    /// underlying one untouched.
    pub fn selected_subset(&self) -> DiffResult {
        DiffResult {
            to_add: filter_selected(&self.diff.to_add, &self.selection, DiffCategory::Add),
            to_modify: filter_selected(&self.diff.to_modify, &self.selection, DiffCategory::Modify),
            to_delete: filter_selected(&self.diff.to_delete, &self.selection, DiffCategory::Delete),
        }
    }

    pub(crate) fn begin_apply(&mut self) {
        self.state = SessionState::Applying;
    }

    pub(crate) fn complete(&mut self) {
        self.state = SessionState::Completed;
    }

    pub(crate) fn fail(&mut self) {
        self.state = SessionState::Failed;
    }
}

fn filter_selected<T: Clone>(
    items: &[T],
    selection: &ApprovalSelection,
    category: DiffCategory,
) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter(|(index, _)| selection.is_selected(category, *index))
        .map(|(_, item)| item.clone())
        .collect()
}
