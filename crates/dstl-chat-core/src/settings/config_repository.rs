use thiserror::Error;

use super::client_config::ClientConfig;
use crate::store::BoxFuture;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Repository trait for client configuration persistence
pub trait ConfigRepository: Send + Sync + 'static {
    /// Load the configuration; a missing file yields the defaults.
    fn load(&self) -> BoxFuture<'static, ConfigResult<ClientConfig>>;

    fn save(&self, config: ClientConfig) -> BoxFuture<'static, ConfigResult<()>>;
}
