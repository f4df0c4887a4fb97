#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the fremit stream engine.
//!
//! A single optional TOML file supplies the `[engine]` and `[logging]`
//! sections. `FREMIT_*` environment variables fill fields the file leaves
//! unset, and built-in defaults cover the rest.
//!
//! ```rust,no_run
//! use fremit_config::Config;
//!
//! let config = Config::load(Some(std::path::Path::new("fremit.toml"))).unwrap();
//! println!("engine: {}", config.engine.name);
//! ```
//!
//! This crate has no dependencies on other internal fremit crates. The CLI
//! converts these types into engine and telemetry settings.

/// Environment variable fallback.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from an optional file plus the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, or
    /// the final configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load configuration with an explicit environment snapshot.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_env(
        path: Option<&std::path::Path>,
        env: &std::collections::HashMap<String, String>,
    ) -> ConfigResult<Self> {
        loader::load_with_env(path, env)
    }

    /// Render the configuration as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if serialization fails.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_toml_round_trips_through_load() {
        let mut config = Config::default();
        config.engine.name = "roundtrip".to_owned();
        config.logging.directives.push("fremit_stream=trace".to_owned());

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[engine]"));
        assert!(rendered.contains("name = \"roundtrip\""));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
