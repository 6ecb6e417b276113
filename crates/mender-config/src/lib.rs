//! Runtime configuration for the `mender` binary.
//!
//! Values come from command-line flags, falling back to the `MENDER_*`
//! environment variables and finally to built-in defaults. [`ConfigArgs`]
//! declares the flags for `clap`; [`ConfigArgs::resolve`] validates them into
//! a [`Config`], failing fast on the first unusable value.

mod error;

use std::num::NonZeroUsize;
use std::thread;

use clap::Args;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use error::ConfigError;

/// Filter applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log line formats written to stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Flattened JSON events.
    #[default]
    Json,
    /// Compact human-readable lines.
    Compact,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    log_filter: String,
    log_format: LogFormat,
    workers: NonZeroUsize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: LogFormat::default(),
            workers: default_workers(),
        }
    }
}

impl Config {
    /// Returns the `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log line format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns how many files may be processed at once.
    #[must_use]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }
}

/// Worker count used when none is configured: the available parallelism.
#[must_use]
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Configuration flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Log filter directive, such as `info` or `mender_syntax=debug`.
    #[arg(long, global = true, env = "MENDER_LOG_FILTER")]
    pub log_filter: Option<String>,
    /// Log format: `json` or `compact`.
    #[arg(long, global = true, env = "MENDER_LOG_FORMAT")]
    pub log_format: Option<String>,
    /// Maximum number of files processed at once.
    #[arg(long, global = true, env = "MENDER_WORKERS")]
    pub workers: Option<String>,
}

impl ConfigArgs {
    /// Validates the flags, filling gaps with defaults.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: an empty filter, an unknown
    /// log format, or a worker count that is not a positive integer.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let log_filter = match self.log_filter.as_deref().map(str::trim) {
            None => DEFAULT_LOG_FILTER.to_owned(),
            Some("") => return Err(ConfigError::EmptyLogFilter),
            Some(filter) => filter.to_owned(),
        };

        let log_format = match self.log_format.as_deref() {
            None => LogFormat::default(),
            Some(value) => value.trim().parse::<LogFormat>().map_err(|_| ConfigError::LogFormat {
                value: value.to_owned(),
            })?,
        };

        let workers = match self.workers.as_deref() {
            None => default_workers(),
            Some(value) => value
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::Workers {
                    value: value.to_owned(),
                })?,
        };

        Ok(Config {
            log_filter,
            log_format,
            workers,
        })
    }
}
