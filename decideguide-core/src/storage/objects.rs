use crate::storage::StorageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Flat key/value blob store for respondent uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object. Existing keys are rejected rather than overwritten.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, (String, Vec<u8>)>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::OperationFailed(format!("Lock error: {}", e)))?;

        if objects.contains_key(key) {
            return Err(StorageError::OperationFailed(format!(
                "object {} already exists",
                key
            )));
        }
        objects.insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }
}
