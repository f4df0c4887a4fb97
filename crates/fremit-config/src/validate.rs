//! Configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const VALID_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_engine(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_engine(config: &Config) -> ConfigResult<()> {
    if config.engine.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "engine.name".to_owned(),
            message: "engine name must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !VALID_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                VALID_LEVELS.join(", ")
            ),
        });
    }

    if !VALID_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                VALID_FORMATS.join(", ")
            ),
        });
    }

    if let Some(directory) = &config.logging.directory
        && directory.trim().is_empty()
    {
        return Err(ConfigError::ValidationError {
            field: "logging.directory".to_owned(),
            message: "log directory must not be empty when set".to_owned(),
        });
    }

    Ok(())
}
