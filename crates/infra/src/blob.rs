//! Blob storage for package binaries and product logos.
//!
//! Keys are relative paths: `<model_id>/<version>/<upload>/<file>` for packages
//! and `<model_id>/logo/<upload>/<file>` for logos. `<upload>` is a fresh
//! UUIDv7 per write, so a key is never shared by two rows or two uploads and
//! deleting one row's blob cannot touch another's.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::BlobError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, content: Bytes) -> Result<(), BlobError>;

    async fn get(&self, key: &str) -> Result<Bytes, BlobError>;

    async fn exists(&self, key: &str) -> Result<bool, BlobError>;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

#[async_trait]
impl<S> BlobStore for Arc<S>
where
    S: BlobStore + ?Sized,
{
    async fn put(&self, key: &str, content: Bytes) -> Result<(), BlobError> {
        (**self).put(key, content).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        (**self).get(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        (**self).exists(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        (**self).delete(key).await
    }
}

/// Key for a package binary written by upload `upload`.
pub fn package_key(model_id: &str, version: &str, upload: Uuid, file_name: &str) -> String {
    format!(
        "{}/{}/{upload}/{}",
        segment(model_id),
        segment(version),
        segment(file_name)
    )
}

/// Key for a product logo written by upload `upload`.
pub fn logo_key(model_id: &str, upload: Uuid, file_name: &str) -> String {
    format!("{}/logo/{upload}/{}", segment(model_id), segment(file_name))
}

/// Strip separators so user input cannot add path levels.
fn segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Reject keys that would escape the storage root.
fn checked_relative(key: &str) -> Result<&Path, BlobError> {
    let path = Path::new(key);
    let ok = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(path)
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

/// Blobs stored as plain files under a base directory.
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        Ok(self.base_path.join(checked_relative(key)?))
    }
}

fn io_error(key: &str, err: std::io::Error) -> BlobError {
    if err.kind() == std::io::ErrorKind::NotFound {
        BlobError::NotFound(key.to_string())
    } else {
        BlobError::Io(format!("{key}: {err}"))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, content: Bytes) -> Result<(), BlobError> {
        let path = self.key_to_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(key, e))?;
        }

        let mut file = fs::File::create(&path).await.map_err(|e| io_error(key, e))?;
        file.write_all(&content).await.map_err(|e| io_error(key, e))?;
        file.sync_all().await.map_err(|e| io_error(key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        let path = self.key_to_path(key)?;
        let content = fs::read(&path).await.map_err(|e| io_error(key, e))?;
        Ok(Bytes::from(content))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.key_to_path(key)?;
        fs::try_exists(&path).await.map_err(|e| io_error(key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.key_to_path(key)?;
        fs::remove_file(&path).await.map_err(|e| io_error(key, e))
    }
}

/// In-memory blob store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    inner: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> BlobError {
    BlobError::Io("blob map lock poisoned".to_string())
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, content: Bytes) -> Result<(), BlobError> {
        checked_relative(key)?;
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(key.to_string(), content);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }
}

/// Delete a blob in the background. Failures are logged and never returned.
pub fn spawn_delete(store: Arc<dyn BlobStore>, key: String) {
    let run = async move {
        if let Err(err) = store.delete(&key).await {
            tracing::warn!(key = %key, error = %err, "blob deletion failed");
        }
    };
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(run);
        }
        Err(_) => tracing::warn!("no async runtime; blob deletion skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_model_version_and_upload_layout() {
        let upload = Uuid::now_v7();
        assert_eq!(
            package_key("GW-01", "1.0.0", upload, "fw.bin"),
            format!("GW-01/1.0.0/{upload}/fw.bin")
        );
        assert_eq!(
            logo_key("GW-01", upload, "logo.png"),
            format!("GW-01/logo/{upload}/logo.png")
        );
    }

    #[test]
    fn same_file_under_different_uploads_gets_distinct_keys() {
        let a = package_key("GW-01", "1.0.0", Uuid::now_v7(), "fw.bin");
        let b = package_key("GW-01", "1.0.0", Uuid::now_v7(), "fw.bin");
        assert_ne!(a, b);
    }

    #[test]
    fn separators_in_segments_are_neutralised() {
        let upload = Uuid::now_v7();
        let key = package_key("../etc", "1.0", upload, "a/b.bin");
        assert_eq!(key, format!(".._etc/1.0/{upload}/a_b.bin"));
        assert_eq!(package_key("..", "1", upload, "f"), format!("_/1/{upload}/f"));
        assert!(checked_relative(&key).is_ok());
    }

    #[test]
    fn escaping_keys_are_rejected() {
        assert!(checked_relative("../secret").is_err());
        assert!(checked_relative("/abs/path").is_err());
        assert!(checked_relative("").is_err());
    }

    #[tokio::test]
    async fn in_memory_put_get_delete() {
        let store = InMemoryBlobStore::new();
        store.put("m/1/f.bin", Bytes::from_static(b"abc")).await.unwrap();
        assert!(store.exists("m/1/f.bin").await.unwrap());
        assert_eq!(store.get("m/1/f.bin").await.unwrap(), Bytes::from_static(b"abc"));
        store.delete("m/1/f.bin").await.unwrap();
        assert!(matches!(
            store.delete("m/1/f.bin").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn filesystem_round_trip() {
        let dir = std::env::temp_dir().join(format!("nova-blob-{}", uuid::Uuid::now_v7()));
        let store = FilesystemBlobStore::new(&dir);
        store.put("GW-01/1.0.0/fw.bin", Bytes::from_static(b"fw")).await.unwrap();
        assert!(store.exists("GW-01/1.0.0/fw.bin").await.unwrap());
        assert_eq!(store.get("GW-01/1.0.0/fw.bin").await.unwrap().as_ref(), b"fw");
        store.delete("GW-01/1.0.0/fw.bin").await.unwrap();
        assert!(!store.exists("GW-01/1.0.0/fw.bin").await.unwrap());
        assert!(matches!(
            store.get("GW-01/1.0.0/fw.bin").await,
            Err(BlobError::NotFound(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
