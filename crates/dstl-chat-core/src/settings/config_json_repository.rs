use std::path::{Path, PathBuf};

use tracing::debug;

use super::client_config::ClientConfig;
use super::config_repository::{ConfigError, ConfigRepository, ConfigResult};
use crate::store::BoxFuture;

pub struct ConfigJsonRepository {
    file_path: PathBuf,
}

impl ConfigJsonRepository {
    /// Create repository with XDG-compliant path
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::PathError("Cannot determine config directory".into()))?;

        Ok(Self {
            file_path: config_dir.join("dstl-chat").join("config.json"),
        })
    }

    /// Create repository with custom path (for testing)
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl ConfigRepository for ConfigJsonRepository {
    fn load(&self) -> BoxFuture<'static, ConfigResult<ClientConfig>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            if !tokio::fs::try_exists(&path).await? {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(ClientConfig::default());
            }

            let contents = tokio::fs::read_to_string(&path).await?;
            let config: ClientConfig = serde_json::from_str(&contents)?;
            Ok(config)
        })
    }

    fn save(&self, config: ClientConfig) -> BoxFuture<'static, ConfigResult<()>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let json = serde_json::to_string_pretty(&config)?;

            // Write atomically using temp file + rename
            let temp_path = path.with_extension("json.tmp");
            tokio::fs::write(&temp_path, json).await?;
            tokio::fs::rename(&temp_path, &path).await?;

            Ok(())
        })
    }
}
