//! Config file loading.
//!
//! Loading runs in four steps:
//! 1. Read the TOML file, if one was given, into a raw table
//! 2. Fill fields the file left unset from `FREMIT_*` variables
//! 3. Deserialize the table into [`Config`], taking defaults for the rest
//! 4. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load configuration from `path` with process environment fallbacks.
///
/// When `path` is `None` only defaults and environment variables apply.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, an
/// environment variable is malformed, or the result fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
    load_with_env(path, &collect_env_vars())
}

/// Load configuration from `path` using an explicit environment snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env(path: Option<&Path>, env: &HashMap<String, String>) -> ConfigResult<Config> {
    let mut tree = match path {
        Some(path) => {
            let tree = read_table(path)?;
            info!(path = %path.display(), "loaded config file");
            tree
        },
        None => toml::Table::new(),
    };

    let applied = apply_env_fallbacks(&mut tree, env)?;
    if !applied.is_empty() {
        debug!(count = applied.len(), "applied environment variable fallbacks");
    }

    let config: Config =
        toml::Value::Table(tree)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.map_or_else(|| "<environment>".to_owned(), |p| p.display().to_string()),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

fn read_table(path: &Path) -> ConfigResult<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}
