//! Errors raised while running migration tasks and talking to workers.
//!
//! I/O errors are wrapped in `Arc` so the enum stays cloneable, and worker
//! failures are boxed to keep `Result<_, TaskError>` small.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mender_codemod::CodemodError;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::protocol::SerializedError;

/// Errors from task execution, validation and worker communication.
#[derive(Debug, Error, Clone, IntoStaticStr)]
pub enum TaskError {
    /// The task input is malformed. Reported before any I/O.
    #[error("invalid task input: {message}")]
    InvalidInput {
        /// What is wrong with the input.
        message: String,
    },

    /// The input file does not exist.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// The input file exists but could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The updated source could not be written back.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        /// The file being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The codemod could not transform the file.
    #[error("codemod failed for '{}': {source}", path.display())]
    Codemod {
        /// The file being transformed.
        path: PathBuf,
        /// What the codemod reported.
        #[source]
        source: CodemodError,
    },

    /// A worker message did not follow the protocol.
    #[error("worker protocol violation: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },

    /// The channel to a worker failed.
    #[error("worker transport failed: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// Underlying I/O error, when there is one.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// A worker ran the task and reported a failure.
    #[error("worker failed on '{}': {}", path.display(), error.message)]
    Worker {
        /// The file the worker was processing.
        path: PathBuf,
        /// The failure as reported by the worker.
        error: Box<SerializedError>,
    },
}

impl TaskError {
    /// Creates a [`TaskError::InvalidInput`] error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a [`TaskError::Protocol`] error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a [`TaskError::Transport`] error caused by `source`.
    pub fn transport(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a [`TaskError::Worker`] error.
    pub fn worker(path: &Path, error: SerializedError) -> Self {
        Self::Worker {
            path: path.to_path_buf(),
            error: Box::new(error),
        }
    }

    /// Returns the variant name, used as the error name on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Returns the file the error concerns, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound { path }
            | Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::Codemod { path, .. }
            | Self::Worker { path, .. } => Some(path),
            Self::InvalidInput { .. } | Self::Protocol { .. } | Self::Transport { .. } => None,
        }
    }
}
