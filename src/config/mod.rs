//! Configuration management for projection
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PROJECTION__<section>__<key>`
//!
//! Examples:
//! - `PROJECTION__STORAGE__ROOT=/srv/images`
//! - `PROJECTION__OUTPUT__FORMAT=png`
//! - `PROJECTION__OUTPUT__QUALITY=85`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/projection.toml`.
//! This can be overridden using the `PROJECTION_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, OutputConfig, StorageConfig, StorageProvider, TelemetryConfig};
pub use validation::ValidationError;

use crate::storage::{StorageClient, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Storage setup failed: {0}")]
    StorageError(#[from] StorageError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value is
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Storage client for the configured provider
    pub fn storage_client(&self) -> Result<StorageClient, ConfigError> {
        let client = match self.storage.provider {
            StorageProvider::Local => StorageClient::local(&self.storage.root)?,
            StorageProvider::Memory => StorageClient::in_memory(),
        };
        Ok(client)
    }
}
