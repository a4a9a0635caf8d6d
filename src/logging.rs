use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::config::LoggingConfig;

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// the report; `RUST_LOG` overrides the configured level. An unparsable
/// configured level falls back to the default one with a warning.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let (filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => configured_filter(&config.level),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.format.to_lowercase().as_str() {
        "json" => builder.json().try_init(),
        _ => builder.with_ansi(false).try_init(),
    };
    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))?;

    if let Some(err) = rejected {
        tracing::warn!(
            level = %config.level,
            error = %err,
            fallback = %LoggingConfig::default().level,
            "invalid log level in config"
        );
    }
    Ok(())
}

fn configured_filter(level: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(level) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(LoggingConfig::default().level), Some(err)),
    }
}
