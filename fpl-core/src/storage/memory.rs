//! In-memory object store for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{validate_key, ObjectStore, StorageError};

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock().insert(key.to_string(), body.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        validate_key(to)?;
        let mut objects = self.lock();
        let body = objects
            .get(from)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        objects.insert(to.to_string(), body);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_list_delete() {
        let store = MemoryObjectStore::new();
        store.put("landing/a/x.json", b"1").unwrap();
        store.put("landing/b/y.json", b"2").unwrap();

        assert_eq!(store.get_text("landing/a/x.json").unwrap(), "1");
        assert_eq!(store.list("landing/a/").unwrap(), vec!["landing/a/x.json"]);

        store.copy("landing/a/x.json", "archive/x.json").unwrap();
        store.delete("landing/a/x.json").unwrap();
        assert!(!store.contains("landing/a/x.json"));
        assert_eq!(store.get_text("archive/x.json").unwrap(), "1");
    }

    #[test]
    fn missing_objects_are_not_found() {
        let store = MemoryObjectStore::new();
        assert!(matches!(store.get("nope"), Err(StorageError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(StorageError::NotFound(_))));
        assert!(matches!(store.copy("nope", "b"), Err(StorageError::NotFound(_))));
    }
}
