//! Errors surfaced by the binary.

use std::io;

use mender_codemod::RuleFileError;
use mender_config::ConfigError;
use mender_task::TaskError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to load rules: {0}")]
    Rules(Box<RuleFileError>),
    #[error(transparent)]
    Task(Box<TaskError>),
    #[error("failed to locate the mender executable: {0}")]
    CurrentExe(io::Error),
    #[error("failed to serialise output: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(io::Error),
    #[error("{failed} of {total} files could not be migrated")]
    DispatchFailed { failed: usize, total: usize },
}

impl From<RuleFileError> for AppError {
    fn from(error: RuleFileError) -> Self {
        Self::Rules(Box::new(error))
    }
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> Self {
        Self::Task(Box::new(error))
    }
}
