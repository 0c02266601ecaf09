//! Flag file storage backends.

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::errors::ServiceError;

/// Capability surface of the flag object store: save under a generated path,
/// existence check, delete, and public URL resolution. Injected into the
/// country service so tests can substitute the in-memory implementation.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Store the bytes under a freshly generated `flags/<uuid>.<ext>` path and
    /// return that path.
    async fn save(&self, ext: &str, bytes: &[u8]) -> Result<String, ServiceError>;

    async fn exists(&self, path: &str) -> bool;

    async fn delete(&self, path: &str) -> Result<(), ServiceError>;

    /// Resolve a stored path to the URL it is served under.
    fn url(&self, path: &str) -> String;
}
