//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, ServerConfig, AgentConfig, ...)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks that collect every problem found

mod defaults;
mod types;
mod validation;

pub use types::{
    AgentConfig, ChannelsConfig, Config, ConfigError, LogFormat, LoggingConfig, LogsConfig,
    ServerConfig,
};
pub use validation::{ValidationError, validate};
