//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

/// Ensure the flag storage directory exists before the server starts
/// accepting uploads.
pub async fn ensure_env(storage_root: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(storage_root)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {storage_root}: {e}"))?;
    Ok(())
}
