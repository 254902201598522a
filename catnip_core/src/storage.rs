use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// File-backed key-value store, one JSON file per key under a root directory.
///
/// The public interface never fails: any underlying error (unreadable
/// directory, corrupted JSON, full disk) is logged and degrades to `None` or
/// a no-op. A missing key and an undecodable value are indistinguishable to
/// callers. Internally every operation goes through a fallible `try_*`
/// counterpart, so the swallowing happens in exactly one place per operation.
#[derive(Debug, Clone)]
pub struct KvStore {
    root: PathBuf,
}

impl KvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!("Error reading storage key `{}`: {}", key, error);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(error) = self.try_set(key, value) {
            tracing::error!("Error setting storage key `{}`: {}", key, error);
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(error) = self.try_remove(key) {
            tracing::error!("Error removing storage key `{}`: {}", key, error);
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let value = serde_json::from_str(&content)?;
        Ok(Some(value))
    }

    fn try_set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let content = serde_json::to_string(value)?;
        fs::write(self.path(key), content)?;
        Ok(())
    }

    fn try_remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use serde::{Deserialize, Serialize};

    use super::KvStore;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Record {
        id: String,
        count: u32,
        tags: Vec<String>,
    }

    fn record() -> Record {
        Record {
            id: "x".to_string(),
            count: 3,
            tags: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::new(dir.path());

        store.set("record", &record());
        assert_eq!(store.get::<Record>("record"), Some(record()));
    }

    #[test]
    fn test_get_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::new(dir.path());
        assert_eq!(store.get::<Record>("nothing"), None);
    }

    #[test]
    fn test_get_corrupted_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::new(dir.path());
        std::fs::write(dir.path().join("record.json"), "{not json").unwrap();
        assert_eq!(store.get::<Record>("record"), None);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::new(dir.path());

        store.set("record", &record());
        store.remove("record");
        assert_eq!(store.get::<Record>("record"), None);
        assert!(!dir.path().join("record.json").exists());

        // Removing an absent key is a no-op.
        store.remove("record");
    }

    #[test]
    fn test_set_never_fails_on_unwritable_root() {
        let store = KvStore::new("/dev/null/not-a-directory");
        store.set("record", &record());
        assert_eq!(store.get::<Record>("record"), None);
    }
}
