//! Rendering and interactive selection for an approval session.

use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};

use crate::domain::{
    ApplyOutcome, CandidateEntry, DiffCategory, DiffResult, FieldChange, LedgerEntry, ModifyItem,
};
use crate::engine::ApprovalSession;

use super::output::{info, section, success, warning};

pub fn format_candidate(candidate: &CandidateEntry) -> String {
    format!(
        "{}  {:?}  {:.2}  {} [{}]",
        candidate.posting_date,
        candidate.kind,
        candidate.amount,
        candidate.description,
        candidate.reconcile_key()
    )
}

pub fn format_entry(entry: &LedgerEntry) -> String {
    format!(
        "{}  {:?}  {:.2}  {} [{}]",
        entry.posting_date,
        entry.kind,
        entry.amount,
        entry.description,
        entry.origin_id.as_deref().unwrap_or("-")
    )
}

pub fn format_modify(item: &ModifyItem) -> String {
    let changes: Vec<String> = item
        .changed_fields
        .iter()
        .map(|change| match change {
            FieldChange::Description { from, to } => format!("description: {from} → {to}"),
            FieldChange::Amount { from, to } => format!("amount: {from:.2} → {to:.2}"),
            FieldChange::PostingDate { from, to } => format!("posting date: {from} → {to}"),
            FieldChange::Category { from, to } => format!("category: {from} → {to}"),
            FieldChange::Kind { from, to } => format!("kind: {from:?} → {to:?}"),
        })
        .collect();
    format!("{} ({})", format_entry(&item.before), changes.join(", "))
}

/// Prints the three diff sections.
pub fn print_diff(diff: &DiffResult) {
    section("Reconciliation review");
    if diff.is_empty() {
        success("Ledger already matches the external source.");
        return;
    }
    if !diff.to_add.is_empty() {
        info(format!("New entries ({}):", diff.to_add.len()));
        for candidate in &diff.to_add {
            info(format!("  + {}", format_candidate(candidate)));
        }
    }
    if !diff.to_modify.is_empty() {
        info(format!("Changed entries ({}):", diff.to_modify.len()));
        for item in &diff.to_modify {
            info(format!("  ~ {}", format_modify(item)));
        }
    }
    if !diff.to_delete.is_empty() {
        info(format!("Removed at source ({}):", diff.to_delete.len()));
        for entry in &diff.to_delete {
            info(format!("  - {}", format_entry(entry)));
        }
    }
}

/// Runs one multi-select per non-empty category, writing the checked state
/// back into the session, then asks for final confirmation. Returns whether
/// the operator wants the selection applied.
pub fn review_interactively(session: &mut ApprovalSession) -> Result<bool, dialoguer::Error> {
    let theme = ColorfulTheme::default();

    let add_labels: Vec<String> = session.diff().to_add.iter().map(format_candidate).collect();
    if !select_category(session, DiffCategory::Add, "Entries to add", &add_labels, &theme)? {
        return Ok(false);
    }
    let modify_labels: Vec<String> = session.diff().to_modify.iter().map(format_modify).collect();
    if !select_category(
        session,
        DiffCategory::Modify,
        "Entries to update",
        &modify_labels,
        &theme,
    )? {
        return Ok(false);
    }
    let delete_labels: Vec<String> = session.diff().to_delete.iter().map(format_entry).collect();
    if !select_category(
        session,
        DiffCategory::Delete,
        "Entries to delete",
        &delete_labels,
        &theme,
    )? {
        return Ok(false);
    }

    let selected = session.selected_counts();
    if selected.is_zero() {
        warning("Nothing selected.");
        return Ok(false);
    }
    Confirm::with_theme(&theme)
        .with_prompt(format!("Apply {} selected operation(s)?", selected.total()))
        .default(true)
        .interact()
}

fn select_category(
    session: &mut ApprovalSession,
    category: DiffCategory,
    prompt: &str,
    labels: &[String],
    theme: &ColorfulTheme,
) -> Result<bool, dialoguer::Error> {
    if labels.is_empty() {
        return Ok(true);
    }
    let defaults: Vec<bool> = (0..labels.len())
        .map(|index| session.is_selected(category, index))
        .collect();
    let picked = MultiSelect::with_theme(theme)
        .with_prompt(prompt)
        .items(labels)
        .defaults(&defaults)
        .interact_opt()?;
    let Some(picked) = picked else {
        return Ok(false);
    };
    session.select_all(category, false);
    for index in picked {
        session.set_selected(category, index, true);
    }
    Ok(true)
}

/// Prints the commit outcome, one line per failed item.
pub fn print_outcome(outcome: &ApplyOutcome) {
    success(format!(
        "Applied: {} added, {} modified, {} deleted.",
        outcome.added, outcome.modified, outcome.deleted
    ));
    if !outcome.is_clean() {
        warning(format!("{} operation(s) failed:", outcome.failures.len()));
        for failure in &outcome.failures {
            warning(format!(
                "  {:?} {}: {}",
                failure.category, failure.reference, failure.message
            ));
        }
    }
}
