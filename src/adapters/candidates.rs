use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::CandidateEntry;
use crate::errors::FetchError;

use super::CandidateProvider;

/// Candidate provider backed by a JSON document containing a candidate list.
///
/// Stands in for the hosted calendar integration in CLI and test flows; the
/// file holds the already-normalized candidate entries for one project.
#[derive(Debug, Clone)]
pub struct JsonCandidateFile {
    path: PathBuf,
}

impl JsonCandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CandidateProvider for JsonCandidateFile {
    async fn fetch_candidates(&self, _project_id: Uuid) -> Result<Vec<CandidateEntry>, FetchError> {
        let data = fs::read_to_string(&self.path)
            .map_err(|err| FetchError::Source(format!("{}: {err}", self.path.display())))?;
        serde_json::from_str(&data)
            .map_err(|err| FetchError::Malformed(format!("{}: {err}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let provider = JsonCandidateFile::new("/nonexistent/candidates.json");
        let err = provider
            .fetch_candidates(Uuid::new_v4())
            .await
            .expect_err("missing file must fail");
        assert!(matches!(err, FetchError::Source(_)));
    }

    #[tokio::test]
    async fn malformed_payload_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        fs::write(&path, "{not json").unwrap();
        let provider = JsonCandidateFile::new(&path);
        let err = provider
            .fetch_candidates(Uuid::new_v4())
            .await
            .expect_err("malformed file must fail");
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn well_formed_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        fs::write(
            &path,
            r#"[{"source_uid":"evt-1","origin_id":"c1","kind":"revenue","category":"medição","description":"Medição 1","amount":1000.00,"posting_date":"2024-01-10"}]"#,
        )
        .unwrap();
        let provider = JsonCandidateFile::new(&path);
        let list = provider.fetch_candidates(Uuid::new_v4()).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].reconcile_key(), "c1");
    }
}
