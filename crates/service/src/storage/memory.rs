use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::FlagStore;

/// In-memory flag store for tests and examples.
#[derive(Default)]
pub struct MemoryFlagStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn save(&self, ext: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        let path = format!("flags/{}.{}", Uuid::new_v4(), ext);
        self.files.write().await.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.read().await.contains_key(path)
    }

    async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        match self.files.write().await.remove(path) {
            Some(_) => Ok(()),
            None => Err(ServiceError::Storage(format!("no such file: {}", path))),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("/storage/{}", path)
    }
}
