//! Append-only completion history, one JSON record per line.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use audit_engine::{CompletionRecord, HistoryStore, StoreError};

use crate::io_error;

#[derive(Debug, Clone)]
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    /// History at `<state_dir>/history.jsonl`.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("history.jsonl"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records for one dossier, oldest first.
    pub fn for_dossier(&self, dossier_key: &str) -> Result<Vec<CompletionRecord>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| r.dossier_key == dossier_key)
            .collect())
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&mut self, record: &CompletionRecord) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_error(dir, "creating store dir", e))?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_error(&self.path, "opening history", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| io_error(&self.path, "appending record", e))?;
        log::debug!("appended session {} to {}", record.session_id, self.path.display());
        Ok(())
    }

    fn list(&self) -> Result<Vec<CompletionRecord>, StoreError> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)
            .map_err(|e| io_error(&self.path, "opening history", e))?;

        let mut records = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| io_error(&self.path, "reading history", e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                detail: format!("line {}: {e}", n + 1),
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_core::Dossier;
    use uuid::Uuid;

    fn record(dossier: &str) -> CompletionRecord {
        let dossier = Dossier::new(dossier);
        CompletionRecord {
            session_id: Uuid::new_v4(),
            dossier_key: dossier.key(),
            dossier,
            control_type: "lcb-ft".into(),
            started_at: "2024-05-02T09:00:00Z".into(),
            completed_at: "2024-05-02T09:40:00Z".into(),
            documents: Vec::new(),
            anomaly_count: 0,
            optional_anomaly_count: 0,
            revision_of: None,
            modified_fields: Default::default(),
        }
    }

    #[test]
    fn append_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonlHistoryStore::new(dir.path());
        assert!(store.list().unwrap().is_empty());

        let a = record("D-1");
        let b = record("D-2");
        store.append(&a).unwrap();
        store.append(&b).unwrap();

        let all = store.list().unwrap();
        assert_eq!(all, vec![a.clone(), b.clone()]);
        assert_eq!(store.find(b.session_id).unwrap(), Some(b));
        assert_eq!(store.for_dossier(&a.dossier_key).unwrap(), vec![a]);
    }

    #[test]
    fn corrupt_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonlHistoryStore::new(dir.path());
        store.append(&record("D-1")).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .unwrap()
            .write_all(b"{not json\n")
            .unwrap();

        match store.list() {
            Err(StoreError::Corrupt { detail, .. }) => assert!(detail.starts_with("line 2")),
            other => panic!("expected corrupt entry, got {other:?}"),
        }
    }
}
