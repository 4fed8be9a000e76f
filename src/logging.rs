//! Tracing setup for the `arkiver` binary.
//!
//! Console output goes to stderr so it never mixes with the run summary on
//! stdout. `RUST_LOG`, when set, overrides both the configured level and
//! `--verbose`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Map a configured level name to a filter directive.
///
/// Accepts the usual names in any case, plus `WARNING` and `CRITICAL`.
/// Anything unrecognised falls back to `info`.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        "off" => "off",
        _ => "info",
    }
}

pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let default = if verbose {
        "debug"
    } else {
        level_directive(&config.level)
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("Failed to create log filter")?;

    let console = config
        .console
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let file = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(handle)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("Critical"), "error");
        assert_eq!(level_directive(" debug "), "debug");
        assert_eq!(level_directive("loud"), "info");
    }
}
