use async_trait::async_trait;
use decideguide_core::storage::{ObjectStore, StorageError};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Object store backed by a directory; keys map to relative paths below it.
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

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StorageError::OperationFailed(format!(
                "invalid object key '{}'",
                key
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    StorageError::OperationFailed(format!("object {} already exists", key))
                }
                _ => StorageError::OperationFailed(e.to_string()),
            })?;
        file.write_all(&bytes)
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put_object("3/none/1700000000000-plan.pdf", b"%PDF".to_vec(), "application/pdf")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("3/none/1700000000000-plan.pdf")).unwrap();
        assert_eq!(written, b"%PDF");
    }

    #[tokio::test]
    async fn test_existing_key_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put_object("a.txt", b"one".to_vec(), "text/plain").await.unwrap();
        let second = store.put_object("a.txt", b"two".to_vec(), "text/plain").await;

        assert!(second.is_err());
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_the_root() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path().join("uploads"));

        for key in ["../outside.txt", "/etc/passwd", ""] {
            assert!(store.put_object(key, Vec::new(), "text/plain").await.is_err());
        }
    }
}
