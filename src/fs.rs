//! Local file access used by uploads.

use std::path::Path;

use async_trait::async_trait;

use crate::error::LLMError;

/// File-system primitives the upload path relies on.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn write_text(&self, path: &Path, text: &str) -> Result<(), LLMError>;

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, LLMError>;
}

/// [`FileSystem`] over `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn write_text(&self, path: &Path, text: &str) -> Result<(), LLMError> {
        tokio::fs::write(path, text).await.map_err(|e| {
            LLMError::Io(format!("failed to write {}: {e}", path.display()))
        })
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, LLMError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| LLMError::Io(format!("failed to read {}: {e}", path.display())))
    }
}
