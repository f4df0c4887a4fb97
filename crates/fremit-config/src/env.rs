//! Environment variable fallback.
//!
//! Env vars are **fallback**, not override: they only fill fields that the
//! config file left unset.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

#[derive(Clone, Copy)]
enum ValueKind {
    String,
    Integer,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    key: &'static str,
    kind: ValueKind,
}

/// All supported `FREMIT_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "FREMIT_LOG_LEVEL",
        section: "logging",
        key: "level",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "FREMIT_LOG_FORMAT",
        section: "logging",
        key: "format",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "FREMIT_ENGINE_NAME",
        section: "engine",
        key: "name",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "FREMIT_DRAIN_LIMIT",
        section: "engine",
        key: "drain_limit",
        kind: ValueKind::Integer,
    },
];

/// Snapshot the `FREMIT_*` variables from the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with("FREMIT_"))
        .collect()
}

/// Fill fields missing from `tree` with values from `env`.
///
/// Returns the names of the variables that were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] when an integer variable does not
/// parse, and [`ConfigError::ValidationError`] when the config file uses a
/// non-table value where a section is expected.
pub fn apply_env_fallbacks(
    tree: &mut toml::Table,
    env: &HashMap<String, String>,
) -> ConfigResult<Vec<&'static str>> {
    let mut applied = Vec::new();

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env.get(mapping.var_name) else {
            continue;
        };

        let section = tree
            .entry(mapping.section)
            .or_insert(toml::Value::Table(toml::Table::new()));
        let Some(section) = section.as_table_mut() else {
            return Err(ConfigError::ValidationError {
                field: mapping.section.to_string(),
                message: "expected a table".to_string(),
            });
        };
        if section.contains_key(mapping.key) {
            continue;
        }

        let value = match mapping.kind {
            ValueKind::String => toml::Value::String(raw.clone()),
            ValueKind::Integer => {
                let parsed = raw.trim().parse::<i64>().map_err(|e| ConfigError::EnvError {
                    var_name: mapping.var_name.to_string(),
                    message: format!("expected an integer: {e}"),
                })?;
                toml::Value::Integer(parsed)
            },
        };

        section.insert(mapping.key.to_string(), value);
        debug!(var = mapping.var_name, "Applied environment fallback");
        applied.push(mapping.var_name);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_fallback_fills_missing_fields() {
        let mut tree = toml::Table::new();
        let applied = apply_env_fallbacks(
            &mut tree,
            &env(&[("FREMIT_LOG_LEVEL", "debug"), ("FREMIT_DRAIN_LIMIT", "8")]),
        )
        .unwrap();

        assert_eq!(applied, vec!["FREMIT_LOG_LEVEL", "FREMIT_DRAIN_LIMIT"]);
        assert_eq!(tree["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(tree["engine"]["drain_limit"].as_integer(), Some(8));
    }

    #[test]
    fn test_file_values_win_over_env() {
        let mut tree: toml::Table = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let applied =
            apply_env_fallbacks(&mut tree, &env(&[("FREMIT_LOG_LEVEL", "trace")])).unwrap();

        assert!(applied.is_empty());
        assert_eq!(tree["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_bad_integer_is_env_error() {
        let mut tree = toml::Table::new();
        let err =
            apply_env_fallbacks(&mut tree, &env(&[("FREMIT_DRAIN_LIMIT", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == "FREMIT_DRAIN_LIMIT"));
    }

    #[test]
    fn test_non_table_section_rejected() {
        let mut tree: toml::Table = toml::from_str("logging = 3\n").unwrap();
        let err =
            apply_env_fallbacks(&mut tree, &env(&[("FREMIT_LOG_LEVEL", "info")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
