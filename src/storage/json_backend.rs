use std::{fs, path::Path, path::PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::LedgerStore;
use crate::domain::{EntryOrigin, EntryPatch, LedgerEntry, NewLedgerEntry};
use crate::errors::StoreError;
use crate::utils::{ensure_dir, projects_dir_in, write_atomic};

const LEDGER_EXTENSION: &str = "json";
const CURRENT_SCHEMA_VERSION: u8 = 1;

/// On-disk shape of one project's ledger file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectLedger {
    project_id: Uuid,
    #[serde(default)]
    entries: Vec<LedgerEntry>,
    updated_at: DateTime<Utc>,
    #[serde(default = "ProjectLedger::schema_version_default")]
    schema_version: u8,
}

impl ProjectLedger {
    fn empty(project_id: Uuid) -> Self {
        Self {
            project_id,
            entries: Vec::new(),
            updated_at: Utc::now(),
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Ledger store persisting each project as a JSON file under the data
/// directory. Writes are staged to a temporary file and renamed into place.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    projects_dir: PathBuf,
}

impl JsonLedgerStore {
    /// Opens (and creates, when missing) the store under `base`.
    pub fn new(base: &Path) -> Result<Self, StoreError> {
        let projects_dir = projects_dir_in(base);
        ensure_dir(&projects_dir)?;
        Ok(Self { projects_dir })
    }

    pub fn project_path(&self, project_id: Uuid) -> PathBuf {
        self.projects_dir
            .join(format!("{project_id}.{LEDGER_EXTENSION}"))
    }

    fn load_project(&self, project_id: Uuid) -> Result<ProjectLedger, StoreError> {
        let path = self.project_path(project_id);
        if !path.exists() {
            return Ok(ProjectLedger::empty(project_id));
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save_project(&self, ledger: &ProjectLedger) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(ledger)?;
        write_atomic(&self.project_path(ledger.project_id), &json)?;
        Ok(())
    }

    fn find_project_of(&self, id: Uuid) -> Result<Option<ProjectLedger>, StoreError> {
        for entry in fs::read_dir(&self.projects_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            let data = fs::read_to_string(&path)?;
            let ledger: ProjectLedger = serde_json::from_str(&data)?;
            if ledger.entries.iter().any(|entry| entry.id == id) {
                return Ok(Some(ledger));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn list_external_entries(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let ledger = self.load_project(project_id)?;
        Ok(ledger
            .entries
            .into_iter()
            .filter(LedgerEntry::is_external)
            .collect())
    }

    async fn insert(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let mut ledger = self.load_project(entry.project_id)?;
        if entry.origin == EntryOrigin::External {
            if let Some(origin_id) = entry.origin_id.as_deref() {
                let duplicate = ledger.entries.iter().any(|existing| {
                    existing.is_external() && existing.origin_id.as_deref() == Some(origin_id)
                });
                if duplicate {
                    return Err(StoreError::DuplicateOrigin {
                        project_id: entry.project_id,
                        origin_id: origin_id.to_string(),
                    });
                }
            }
        }
        let stored = entry.into_entry();
        ledger.entries.push(stored.clone());
        ledger.touch();
        self.save_project(&ledger)?;
        Ok(stored)
    }

    async fn update_fields(&self, id: Uuid, patch: EntryPatch) -> Result<(), StoreError> {
        let mut ledger = self.find_project_of(id)?.ok_or(StoreError::NotFound(id))?;
        if let Some(entry) = ledger.entries.iter_mut().find(|entry| entry.id == id) {
            patch.apply_to(entry);
        }
        ledger.touch();
        self.save_project(&ledger)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        let mut ledger = self.find_project_of(id)?.ok_or(StoreError::NotFound(id))?;
        ledger.entries.retain(|entry| entry.id != id);
        ledger.touch();
        self.save_project(&ledger)
    }
}
