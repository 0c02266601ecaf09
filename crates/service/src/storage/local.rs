use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::FlagStore;

/// Filesystem-backed flag store rooted at a configured directory. Stored paths
/// are relative (`flags/<uuid>.<ext>`) and resolve publicly under
/// `public_base`, where the router serves the root directory.
pub struct FsFlagStore {
    root: PathBuf,
    public_base: String,
}

impl FsFlagStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FlagStore for FsFlagStore {
    async fn save(&self, ext: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        let path = format!("flags/{}.{}", Uuid::new_v4(), ext);
        let full = self.root.join(&path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        fs::write(&full, bytes)
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(path)
    }

    async fn exists(&self, path: &str) -> bool {
        fs::metadata(self.root.join(path)).await.is_ok()
    }

    async fn delete(&self, path: &str) -> Result<(), ServiceError> {
        fs::remove_file(self.root.join(path))
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path)
    }
}
