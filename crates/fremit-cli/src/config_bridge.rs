//! Bridge from `fremit_config::Config` to runtime types.

use fremit_config::Config;
use fremit_stream::EngineConfig;
use fremit_telemetry::{LogConfig, LogFormat};

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = LogFormat::from_name(&cfg.logging.format).unwrap_or_default();

    let mut log_config = LogConfig::new(&cfg.logging.level).with_format(format);

    if let Some(directory) = &cfg.logging.directory {
        log_config = log_config.with_file_logging(directory, &cfg.engine.name);
    }
    if !cfg.logging.timestamps {
        log_config = log_config.without_timestamps();
    }
    if !cfg.logging.ansi {
        log_config = log_config.without_ansi();
    }
    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    log_config
}

/// Convert config to [`EngineConfig`].
#[must_use]
pub fn to_engine_config(cfg: &Config) -> EngineConfig {
    EngineConfig::new(&cfg.engine.name).with_drain_limit(cfg.engine.drain_limit)
}
