//! File-backed cache backend
//!
//! Each key maps to one file named by the SHA-256 of the key. A put writes a
//! sibling temp file and renames it over the target, so readers see either
//! the previous value or the new one, never a partial write.

use crate::cache::{types::CacheValue, KvStore};
use crate::error::{Result, TitleCacheError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Persistent cache rooted at a directory
pub struct FileStore {
    base_dir: PathBuf,
    write_seq: AtomicU64,
}

impl FileStore {
    /// Open (and create if needed) the cache directory
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            TitleCacheError::CacheError(format!(
                "Failed to create cache directory {:?}: {}",
                base_dir, e
            ))
        })?;

        Ok(Self {
            base_dir,
            write_seq: AtomicU64::new(0),
        })
    }

    /// Directory holding the cache files
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.base_dir.join(format!("{:x}.json", digest))
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let path = self.path_for(key);

        match tokio::fs::read_to_string(&path).await {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss: {}", key);
                Ok(None)
            }
            Err(e) => Err(TitleCacheError::CacheError(format!(
                "Failed to read {:?}: {}",
                path, e
            ))),
        }
    }

    async fn put(&self, key: &str, value: CacheValue) -> Result<()> {
        let path = self.path_for(key);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));

        tokio::fs::write(&tmp, value.as_bytes())
            .await
            .map_err(|e| TitleCacheError::CacheError(format!("Failed to write {:?}: {}", tmp, e)))?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(TitleCacheError::CacheError(format!(
                "Failed to replace {:?}: {}",
                path, e
            )));
        }

        debug!("Stored cache entry: {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("cache")).unwrap();

        assert_eq!(store.get("missing").await.unwrap(), None);

        store.put("a", "first".to_string()).await.unwrap();
        store.put("a", "second".to_string()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let store = FileStore::open(dir.path()).unwrap();
            store
                .put("http://example.org/.http://example.org/s", "{}".to_string())
                .await
                .unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened
                .get("http://example.org/.http://example.org/s")
                .await
                .unwrap(),
            Some("{}".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        for i in 0..5 {
            store.put(&format!("k{}", i), "v".to_string()).await.unwrap();
        }

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
