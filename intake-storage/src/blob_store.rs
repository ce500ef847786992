//! Filesystem blob store.
//!
//! Keys are slash-separated paths (`{chat_id}/{group}/{message_id}/{name}`)
//! resolved under a root directory. A later put to the same key overwrites
//! the earlier object.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use intake_core::{BlobStore, IntakeError, Result};
use tracing::info;

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBlobStore { root: root.into() }
    }

    /// Maps a key to a path under the root. Keys must stay inside the root:
    /// absolute keys and `..` components are refused.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(IntakeError::Storage(format!("invalid blob key: {key:?}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IntakeError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| IntakeError::Storage(e.to_string()))?;

        info!("Stored blob: key={}, bytes={}", key, bytes.len());
        Ok(())
    }
}
