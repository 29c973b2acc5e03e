//! Argument parsing and command dispatch for the operator CLI.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::adapters::{JsonCandidateFile, LedgerStore};
use crate::audit::JsonlAuditLog;
use crate::config::ConfigManager;
use crate::domain::{EntryKind, EntryOrigin, EntryStatus, NewLedgerEntry};
use crate::engine::SyncService;
use crate::errors::CliError;
use crate::storage::JsonLedgerStore;
use crate::utils::app_data_dir;

use super::output::{error, info, success, warning};
use super::review;

const USAGE: &str = "\
Usage:
  recon_core_cli sync <project-uuid> --candidates <file> [options]
  recon_core_cli list <project-uuid> [options]
  recon_core_cli seed <project-uuid> --entries <file> [options]

Options:
  --data-dir <dir>   Override the data directory (default: ~/.recon_core)
  --actor <name>     Operator name recorded in the audit trail (sync)
  --apply-all        Apply the whole diff without interactive review (sync)
  --dry-run          Print the diff and exit without applying (sync)";

#[derive(Debug, Default)]
struct CliArgs {
    command: String,
    project_id: Option<Uuid>,
    candidates: Option<PathBuf>,
    entries: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    actor: Option<String>,
    apply_all: bool,
    dry_run: bool,
}

/// Seed-file entry; the project id comes from the command line.
#[derive(Debug, Deserialize)]
struct SeedEntry {
    kind: EntryKind,
    category: String,
    description: String,
    amount: f64,
    posting_date: NaiveDate,
    origin: EntryOrigin,
    #[serde(default)]
    origin_id: Option<String>,
    #[serde(default = "SeedEntry::default_status")]
    status: EntryStatus,
}

impl SeedEntry {
    fn default_status() -> EntryStatus {
        EntryStatus::Confirmed
    }

    fn into_new(self, project_id: Uuid) -> NewLedgerEntry {
        NewLedgerEntry {
            project_id,
            kind: self.kind,
            category: self.category,
            description: self.description,
            amount: self.amount,
            posting_date: self.posting_date,
            origin: self.origin,
            origin_id: self.origin_id,
            status: self.status,
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs, CliError> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();
    parsed.command = iter
        .next()
        .cloned()
        .ok_or_else(|| CliError::Input(USAGE.into()))?;

    let mut positional = Vec::new();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--candidates" => parsed.candidates = Some(expect_value(&mut iter, arg)?.into()),
            "--entries" => parsed.entries = Some(expect_value(&mut iter, arg)?.into()),
            "--data-dir" => parsed.data_dir = Some(expect_value(&mut iter, arg)?.into()),
            "--actor" => parsed.actor = Some(expect_value(&mut iter, arg)?),
            "--apply-all" => parsed.apply_all = true,
            "--dry-run" => parsed.dry_run = true,
            other if other.starts_with("--") => {
                return Err(CliError::Input(format!("unknown option: {other}")));
            }
            other => positional.push(other.to_string()),
        }
    }

    if let Some(raw) = positional.first() {
        let project_id = Uuid::parse_str(raw)
            .map_err(|_| CliError::Input(format!("invalid project uuid: {raw}")))?;
        parsed.project_id = Some(project_id);
    }
    Ok(parsed)
}

fn expect_value(
    iter: &mut std::slice::Iter<'_, String>,
    flag: &str,
) -> Result<String, CliError> {
    iter.next()
        .cloned()
        .ok_or_else(|| CliError::Input(format!("{flag} requires a value")))
}

/// CLI entry point; `args` excludes the program name.
pub async fn run_cli(args: &[String]) -> Result<(), CliError> {
    let parsed = parse_args(args)?;
    let base = parsed.data_dir.clone().unwrap_or_else(app_data_dir);

    match parsed.command.as_str() {
        "sync" => run_sync(parsed, &base).await,
        "list" => run_list(parsed, &base).await,
        "seed" => run_seed(parsed, &base).await,
        "help" | "--help" | "-h" => {
            info(USAGE);
            Ok(())
        }
        other => Err(CliError::Input(format!(
            "unknown command: {other}\n{USAGE}"
        ))),
    }
}

async fn run_sync(parsed: CliArgs, base: &std::path::Path) -> Result<(), CliError> {
    let project_id = require_project(&parsed)?;
    let candidates_path = parsed
        .candidates
        .clone()
        .ok_or_else(|| CliError::Input("sync requires --candidates <file>".into()))?;

    let store = Arc::new(JsonLedgerStore::new(base)?);
    let provider = Arc::new(JsonCandidateFile::new(candidates_path));
    let audit = Arc::new(JsonlAuditLog::new(base).map_err(|err| CliError::Input(err.to_string()))?);
    let config = ConfigManager::new(base).load()?;
    let service = SyncService::with_config(store, provider, audit, config);

    let actor = parsed.actor.clone().unwrap_or_else(|| "operator".into());
    let mut session = service.start_sync(project_id, actor).await?;

    review::print_diff(session.diff());
    if session.diff().is_empty() || parsed.dry_run {
        service.cancel(session);
        return Ok(());
    }

    let approved = if parsed.apply_all {
        true
    } else {
        review::review_interactively(&mut session)?
    };
    if !approved {
        service.cancel(session);
        warning("Sync cancelled; no changes applied.");
        return Ok(());
    }

    let outcome = service.commit(session).await?;
    review::print_outcome(&outcome);
    Ok(())
}

async fn run_list(parsed: CliArgs, base: &std::path::Path) -> Result<(), CliError> {
    let project_id = require_project(&parsed)?;
    let store = JsonLedgerStore::new(base)?;
    let entries = store.list_external_entries(project_id).await?;
    if entries.is_empty() {
        info("No external entries for this project.");
        return Ok(());
    }
    for entry in &entries {
        info(review::format_entry(entry));
    }
    Ok(())
}

async fn run_seed(parsed: CliArgs, base: &std::path::Path) -> Result<(), CliError> {
    let project_id = require_project(&parsed)?;
    let entries_path = parsed
        .entries
        .clone()
        .ok_or_else(|| CliError::Input("seed requires --entries <file>".into()))?;
    let data = std::fs::read_to_string(&entries_path)
        .map_err(|err| CliError::Input(format!("{}: {err}", entries_path.display())))?;
    let seeds: Vec<SeedEntry> = serde_json::from_str(&data)
        .map_err(|err| CliError::Input(format!("{}: {err}", entries_path.display())))?;

    let store = JsonLedgerStore::new(base)?;
    let mut inserted = 0usize;
    for seed in seeds {
        match store.insert(seed.into_new(project_id)).await {
            Ok(_) => inserted += 1,
            Err(err) => error(format!("skipped entry: {err}")),
        }
    }
    success(format!("Seeded {inserted} entr(y/ies)."));
    Ok(())
}

fn require_project(parsed: &CliArgs) -> Result<Uuid, CliError> {
    parsed
        .project_id
        .ok_or_else(|| CliError::Input(format!("missing <project-uuid>\n{USAGE}")))
}
