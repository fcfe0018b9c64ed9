pub mod client_config;
pub mod config_json_repository;
pub mod config_repository;

pub use client_config::{BASE_URL_ENV, ClientConfig, ReplySettings};
pub use config_json_repository::ConfigJsonRepository;
pub use config_repository::{ConfigError, ConfigRepository, ConfigResult};
