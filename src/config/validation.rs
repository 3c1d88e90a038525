use super::models::{Config, StorageProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("output quality must be within 1..=100, got {0}")]
    InvalidQuality(u8),

    #[error("output compression must be within 0..=9, got {0}")]
    InvalidCompression(u8),

    #[error("local storage root must not be empty")]
    EmptyStorageRoot,

    #[error("telemetry log_filter must not be empty")]
    EmptyLogFilter,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_storage(config)?;
    validate_output(config)?;
    validate_telemetry(config)?;
    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.provider == StorageProvider::Local
        && config.storage.root.as_os_str().is_empty()
    {
        return Err(ValidationError::EmptyStorageRoot);
    }

    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ValidationError> {
    if let Some(quality) = config.output.quality {
        if !(1..=100).contains(&quality) {
            return Err(ValidationError::InvalidQuality(quality));
        }
    }

    if let Some(compression) = config.output.compression {
        if compression > 9 {
            return Err(ValidationError::InvalidCompression(compression));
        }
    }

    Ok(())
}

fn validate_telemetry(config: &Config) -> Result<(), ValidationError> {
    if config.telemetry.log_filter.trim().is_empty() {
        return Err(ValidationError::EmptyLogFilter);
    }

    Ok(())
}
