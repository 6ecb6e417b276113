//! Configuration errors.

use thiserror::Error;

/// A configuration value that cannot be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The log filter is empty.
    #[error("log filter must not be empty")]
    EmptyLogFilter,

    /// The log format is not one of the supported formats.
    #[error("unknown log format '{value}' (expected 'json' or 'compact')")]
    LogFormat {
        /// The format as given.
        value: String,
    },

    /// The worker count is not a positive integer.
    #[error("worker count must be a positive integer, got '{value}'")]
    Workers {
        /// The count as given.
        value: String,
    },
}
