//! JSON file store
//!
//! Keeps every key in one JSON object on disk. Writes go to a sibling temp
//! file that is then renamed over the original, so a crash mid-write leaves
//! either the old document or the new one.

use super::LocalStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Durable [`LocalStore`] persisted as a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(document) => Ok(document),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Store file is corrupt, treating as empty: {}",
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_document(&self, document: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(document.remove(key))
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.extend(entries);
        self.write_document(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("ledger.json"));

        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_many_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let store = FileStore::new(&path);
        store
            .set_many(vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ])
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("2"));
        assert!(!dir.path().join("nested").join("ledger.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_overwritten_on_next_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("a").await.unwrap(), None);

        store
            .set_many(vec![("a".to_string(), "1".to_string())])
            .await
            .unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
