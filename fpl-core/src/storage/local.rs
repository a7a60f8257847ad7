//! Filesystem-backed object store.
//!
//! Layout: `{root}/{key}` with key segments mapped to directories.
//! Writes are atomic (write to `.tmp`, rename into place); `.tmp` files are
//! never listed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{validate_key, ObjectStore, StorageError};

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_keys(&path, keys)?;
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some("tmp") {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(&self.root) {
                let key: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                keys.push(key.join("/"));
            }
        }
        Ok(())
    }
}

fn io_err(key: &str, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io {
            key: key.to_string(),
            message: e.to_string(),
        }
    }
}

fn ensure_parent(key: &str, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(key, e))?;
    }
    Ok(())
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        ensure_parent(key, &path)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, body).map_err(|e| io_err(key, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_err(key, e)
        })
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(path).map_err(|e| io_err(key, e))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        self.collect_keys(&self.root, &mut keys)
            .map_err(|e| io_err(prefix, e))?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let src = self.path_for(from)?;
        let dst = self.path_for(to)?;
        ensure_parent(to, &dst)?;
        fs::copy(&src, &dst).map(|_| ()).map_err(|e| io_err(from, e))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::remove_file(path).map_err(|e| io_err(key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("landing/fpl-api/teams/teams_01012025.json", b"{}").unwrap();
        store.put("configs/load_config.csv", b"a,b").unwrap();

        assert!(dir.path().join("landing/fpl-api/teams/teams_01012025.json").exists());
        assert_eq!(
            store.list("landing/").unwrap(),
            vec!["landing/fpl-api/teams/teams_01012025.json"]
        );
        assert_eq!(store.get_text("configs/load_config.csv").unwrap(), "a,b");
    }

    #[test]
    fn overwrite_leaves_no_tmp_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        store.put("a/b.json", b"one").unwrap();
        store.put("a/b.json", b"two").unwrap();

        assert_eq!(store.get_text("a/b.json").unwrap(), "two");
        assert_eq!(store.list("").unwrap(), vec!["a/b.json"]);
    }

    #[test]
    fn copy_then_delete_moves_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        store.put("landing/x.json", b"x").unwrap();

        store.copy("landing/x.json", "archive/2025/01/01/x.json").unwrap();
        store.delete("landing/x.json").unwrap();

        assert!(matches!(store.get("landing/x.json"), Err(StorageError::NotFound(_))));
        assert_eq!(store.get_text("archive/2025/01/01/x.json").unwrap(), "x");
    }

    #[test]
    fn missing_root_lists_nothing() {
        let store = LocalObjectStore::new("/definitely/not/a/real/root");
        assert!(store.list("").unwrap().is_empty());
    }

    #[test]
    fn rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(matches!(store.put("../x", b""), Err(StorageError::InvalidKey(_))));
    }
}
