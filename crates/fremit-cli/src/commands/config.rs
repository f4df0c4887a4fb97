//! CLI handler for the `fremit config` subcommand.

use std::io::Write;

use anyhow::{Context, Result};
use fremit_config::Config;

/// Print the resolved configuration as TOML.
pub(crate) fn show_config(config: &Config, out: &mut impl Write) -> Result<()> {
    let rendered = config.to_toml().context("failed to render config")?;
    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_config_prints_sections() {
        let mut config = Config::default();
        config.engine.drain_limit = 5;

        let mut out = Vec::new();
        show_config(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("[engine]"));
        assert!(text.contains("drain_limit = 5"));
        assert!(text.contains("[logging]"));
        assert!(text.contains("level = \"info\""));
    }
}
