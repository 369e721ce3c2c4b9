//! # Configuration
//!
//! Environment-driven logging settings and the resolution of the output
//! target selected with `-o`.
//!
//! ## Environment Variables
//!
//! - `APIGEN_LOG`: filter directives in `tracing_subscriber::EnvFilter`
//!   syntax (e.g. `apigen=debug`). Overrides the level chosen from `-v`.
//! - `APIGEN_LOG_FORMAT`: `pretty` (default) or `json`.
//! - `APIGEN_LOG_INCLUDE_LOCATION`: `true` adds `file:line` of the emitting
//!   statement to every event.
//!
//! Logs always go to stderr, so `-o -` output on stdout stays clean.

use std::env;
use std::path::{Path, PathBuf};

use crate::spec::GENERATED_SUFFIX;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty, // Default to pretty for an interactive tool
        }
    }
}

/// Logging configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level used when no filter is given: `warn`, or `debug` with `-v`
    pub log_level: String,
    pub format: LogFormat,
    /// Explicit filter directives from `APIGEN_LOG`
    pub filter: Option<String>,
    pub include_location: bool,
}

impl LogConfig {
    /// Read the configuration from the process environment.
    pub fn from_env(verbose: bool) -> Self {
        Self::from_lookup(verbose, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(verbose: bool, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_level: if verbose { "debug" } else { "warn" }.to_string(),
            format: LogFormat::parse(&lookup("APIGEN_LOG_FORMAT").unwrap_or_default()),
            filter: lookup("APIGEN_LOG").filter(|f| !f.trim().is_empty()),
            include_location: lookup("APIGEN_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

/// Where generated code goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Resolve the `-o` flag.
    ///
    /// `-` selects stdout, an absent or empty flag selects
    /// `<dir>/<package>_apigen.rs`, anything else is taken as a path.
    pub fn resolve(flag: Option<&str>, dir: &Path, package: &str) -> Self {
        match flag {
            Some("-") => OutputTarget::Stdout,
            Some(path) if !path.is_empty() => OutputTarget::File(PathBuf::from(path)),
            _ => OutputTarget::File(dir.join(format!("{package}{GENERATED_SUFFIX}"))),
        }
    }
}
