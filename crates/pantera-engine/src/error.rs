//! Engine errors.

use pantera_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Collapse a rejected configuration into [`EngineError::InvalidConfig`].
    pub fn from_validation(err: ConfigError) -> Self {
        match err {
            ConfigError::Rejected(messages) => EngineError::InvalidConfig(messages),
            other => EngineError::Config(other),
        }
    }
}
