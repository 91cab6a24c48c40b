//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.host is required")]
    MissingHost,
    #[error("server.port must not be 0")]
    InvalidPort,
    #[error("server.nickname is required")]
    MissingNickname,
    #[error("server.nickname must not contain spaces, got '{0}'")]
    InvalidNickname(String),
    #[error("agent.channel_limit must be at least 1")]
    InvalidChannelLimit,
    #[error("agent.reconnection_interval must be at least 1 second")]
    InvalidReconnectionInterval,
    #[error("logs.directory is required")]
    MissingLogDirectory,
    #[error("channels.database parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Server identity
    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if config.server.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    let nick = &config.server.nickname;
    if nick.trim().is_empty() {
        errors.push(ValidationError::MissingNickname);
    } else if nick.contains(' ') {
        errors.push(ValidationError::InvalidNickname(nick.clone()));
    }

    // Pacing
    if config.agent.channel_limit == 0 {
        errors.push(ValidationError::InvalidChannelLimit);
    }
    if config.agent.reconnection_interval == 0 {
        errors.push(ValidationError::InvalidReconnectionInterval);
    }

    if config.logs.directory.trim().is_empty() {
        errors.push(ValidationError::MissingLogDirectory);
    }

    // Channel database path
    if let Some(ref db) = config.channels.database {
        let db_path = Path::new(db);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
