use std::path::{Path, PathBuf};

use crate::error::{Result, VhError};
use crate::models::Config;

use super::artifact::write_atomic;

/// The persisted virtual host document.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. `None` means nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<Config>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.load_error(e))?;
        let config = Config::from_document(&document).map_err(|e| self.load_error(e))?;
        Ok(Some(config))
    }

    pub async fn save(&self, config: &Config) -> Result<()> {
        let document = config.to_document()?;
        write_atomic(&self.path, &document).await
    }

    fn load_error(&self, reason: impl std::fmt::Display) -> VhError {
        VhError::Load {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
