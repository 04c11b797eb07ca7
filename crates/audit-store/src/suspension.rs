//! One snapshot file per suspended (dossier, control type) pair.

use std::path::{Path, PathBuf};

use audit_engine::{StoreError, SuspensionKey, SuspensionStore};

use crate::io_error;

const EXTENSION: &str = "das";

/// Suspension store backed by a directory tree.
#[derive(Debug, Clone)]
pub struct DirSuspensionStore {
    root: PathBuf,
}

impl DirSuspensionStore {
    /// Store rooted at `<state_dir>/suspended`.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            root: state_dir.join("suspended"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &SuspensionKey) -> Result<PathBuf, StoreError> {
        for part in [&key.control_type, &key.dossier_key] {
            if !is_safe_component(part) {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    detail: format!("'{part}' cannot be used as a file name"),
                });
            }
        }
        Ok(self
            .root
            .join(&key.control_type)
            .join(format!("{}.{EXTENSION}", key.dossier_key)))
    }
}

fn is_safe_component(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl SuspensionStore for DirSuspensionStore {
    fn get(&self, key: &SuspensionKey) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.entry_path(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        std::fs::read(&path)
            .map(Some)
            .map_err(|e| io_error(&path, "reading snapshot", e))
    }

    fn put(&mut self, key: &SuspensionKey, snapshot: Vec<u8>) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_error(dir, "creating store dir", e))?;
        }
        // Write then rename, so a crash never leaves a half-written snapshot.
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        std::fs::write(&tmp, &snapshot).map_err(|e| io_error(&tmp, "writing snapshot", e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(&path, "replacing snapshot", e))?;
        log::debug!("wrote {} byte snapshot to {}", snapshot.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &SuspensionKey) -> Result<bool, StoreError> {
        let path = self.entry_path(key)?;
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|e| io_error(&path, "removing snapshot", e))?;
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<SuspensionKey>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for control in read_dir(&self.root)? {
            if !control.is_dir() {
                continue;
            }
            let Some(control_type) = file_name(&control) else {
                continue;
            };
            for entry in read_dir(&control)? {
                if entry.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                if let Some(stem) = entry.file_stem().and_then(|s| s.to_str()) {
                    keys.push(SuspensionKey::new(stem, control_type.clone()));
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, "listing", e))? {
        let entry = entry.map_err(|e| io_error(dir, "reading entry", e))?;
        paths.push(entry.path());
    }
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(dossier: &str) -> SuspensionKey {
        SuspensionKey::new(dossier, "lcb-ft")
    }

    #[test]
    fn put_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirSuspensionStore::new(dir.path());
        assert_eq!(store.get(&key("abc123")).unwrap(), None);

        store.put(&key("abc123"), b"snapshot".to_vec()).unwrap();
        assert_eq!(store.get(&key("abc123")).unwrap(), Some(b"snapshot".to_vec()));
        assert!(dir.path().join("suspended/lcb-ft/abc123.das").is_file());

        store.put(&key("abc123"), b"newer".to_vec()).unwrap();
        assert_eq!(store.get(&key("abc123")).unwrap(), Some(b"newer".to_vec()));

        assert!(store.remove(&key("abc123")).unwrap());
        assert!(!store.remove(&key("abc123")).unwrap());
    }

    #[test]
    fn keys_are_listed_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirSuspensionStore::new(dir.path());
        assert!(store.keys().unwrap().is_empty());

        store.put(&key("bbb"), vec![1]).unwrap();
        store.put(&key("aaa"), vec![2]).unwrap();
        store
            .put(&SuspensionKey::new("ccc", "operation"), vec![3])
            .unwrap();

        let keys = store.keys().unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], key("aaa"));
        assert_eq!(keys[1], key("bbb"));
        assert_eq!(keys[2].control_type, "operation");
    }

    #[test]
    fn path_traversal_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirSuspensionStore::new(dir.path());
        let bad = SuspensionKey::new("../escape", "lcb-ft");
        assert!(matches!(
            store.put(&bad, vec![0]),
            Err(StoreError::Io { .. })
        ));
    }
}
