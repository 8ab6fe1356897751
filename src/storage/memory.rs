use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{ObjectStore, StoredObject, WriteCondition};
use crate::utils::AppError;

/// In-process object store with the same conditional-write semantics as S3.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    next_version: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        condition: WriteCondition,
    ) -> Result<Option<String>, AppError> {
        let mut objects = self.objects.write().await;

        if let WriteCondition::IfMatch(expected) = &condition {
            let current = objects.get(key).and_then(|object| object.version.as_deref());
            if current != Some(expected.as_str()) {
                return Err(AppError::Conflict(format!("{} was modified concurrently", key)));
            }
        }

        let version = format!("\"v{}\"", self.next_version.fetch_add(1, Ordering::Relaxed) + 1);
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                version: Some(version.clone()),
            },
        );

        Ok(Some(version))
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}
