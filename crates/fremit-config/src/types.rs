use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings.
    pub engine: EngineSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Label attached to the engine's log events.
    pub name: String,
    /// Maximum deferred tasks run per drain (0 = unlimited).
    pub drain_limit: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            name: "fremit".to_string(),
            drain_limit: 0,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter: `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Extra filter directives such as `fremit_stream=trace`.
    pub directives: Vec<String>,
    /// Whether to include timestamps.
    pub timestamps: bool,
    /// Whether to use ANSI colors.
    pub ansi: bool,
    /// Directory for daily-rotated log files; stderr when unset.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directives: Vec::new(),
            timestamps: true,
            ansi: true,
            directory: None,
        }
    }
}
