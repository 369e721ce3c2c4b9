//! Tracing subscriber setup.
//!
//! Events go to stderr through a `tracing_subscriber::fmt` layer in pretty
//! or JSON form. The filter comes from `APIGEN_LOG` when set, else from the
//! level chosen by the CLI.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogConfig, LogFormat};

/// Build the filter of `config`.
///
/// Invalid directives in `APIGEN_LOG` fall back to the configured level.
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    match &config.filter {
        Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|err| {
            eprintln!("apigen: invalid APIGEN_LOG directive {filter:?}: {err}");
            EnvFilter::new(&config.log_level)
        }),
        None => EnvFilter::new(&config.log_level),
    }
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the global subscriber.
///
/// Only the first call installs anything; later calls succeed without
/// touching the installed subscriber.
///
/// # Example
///
/// ```no_run
/// use apigen::config::LogConfig;
/// use apigen::logging::init_logging;
///
/// init_logging(&LogConfig::from_env(false)).unwrap();
/// ```
pub fn init_logging(config: &LogConfig) -> Result<()> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_init_logging_twice() {
        let config = LogConfig::from_lookup(true, |_| None);
        init_logging(&config).unwrap();
        init_logging(&config).unwrap();
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LogConfig::from_lookup(false, |key| {
            (key == "APIGEN_LOG").then(|| "apigen=[".to_string())
        });
        assert_eq!(env_filter(&config).to_string(), "warn");
    }
}
