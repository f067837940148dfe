use crate::config::ArtifactConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Binary blob storage for generated artifacts, addressed by relative key
/// such as `qr_codes/JOHN000_qr.png`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous blob, and returns the key.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> AppResult<String>;

    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
}

/// Keeps artifacts as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(&config.root_dir)
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::ArtifactError(format!("Invalid artifact key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> AppResult<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        log::debug!("Stored artifact {}", path.display());
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
