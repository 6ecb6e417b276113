//! Errors raised while running codemods and loading rule files.
//!
//! I/O errors are wrapped in `Arc` so the enums stay cloneable and small
//! enough for the `result_large_err` lint.

use std::path::PathBuf;
use std::sync::Arc;

use mender_syntax::{Position, SyntaxError};
use thiserror::Error;

/// Errors produced by a [`Codemod`](crate::Codemod).
#[derive(Debug, Error, Clone)]
pub enum CodemodError {
    /// The rewrite engine rejected the file.
    #[error("failed to rewrite '{}': {source}", path.display())]
    Syntax {
        /// File being rewritten.
        path: PathBuf,
        /// Underlying engine error.
        #[source]
        source: SyntaxError,
    },

    /// The file does not parse cleanly, so it is not safe to rewrite.
    #[error("'{}' has a syntax error at {position}: {message}", path.display())]
    Unparsable {
        /// File being rewritten.
        path: PathBuf,
        /// Where the first syntax error starts.
        position: Position,
        /// Parser description of the error.
        message: String,
    },

    /// A stage of a composed codemod failed.
    #[error("codemod stage {stage} ('{name}') failed: {source}")]
    Stage {
        /// Zero-based index of the failing stage.
        stage: usize,
        /// Name of the failing codemod.
        name: String,
        /// What went wrong inside the stage.
        #[source]
        source: Box<CodemodError>,
    },

    /// A codemod reported its own failure.
    #[error("{message}")]
    Custom {
        /// Description of the failure.
        message: String,
    },
}

impl CodemodError {
    /// Creates a [`CodemodError::Syntax`] error.
    pub fn syntax(path: impl Into<PathBuf>, source: SyntaxError) -> Self {
        Self::Syntax {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`CodemodError::Custom`] error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// Wraps `self` as the failure of composed stage `stage`.
    #[must_use]
    pub fn in_stage(self, stage: usize, name: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            name: name.into(),
            source: Box::new(self),
        }
    }
}

/// Errors produced while loading a declarative rule file.
#[derive(Debug, Error, Clone)]
pub enum RuleFileError {
    /// The rule file could not be read.
    #[error("failed to read rule file '{}': {source}", path.display())]
    Read {
        /// Path of the rule file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The rule file is not valid YAML or does not have the expected shape.
    #[error("invalid rule file {origin}: {message}")]
    Parse {
        /// Path of the rule file, or `<inline>`.
        origin: String,
        /// Deserialiser description of the problem.
        message: String,
    },

    /// The rule file names a language that is not supported.
    #[error("unsupported language '{language}' in rule file {origin}")]
    Language {
        /// Path of the rule file, or `<inline>`.
        origin: String,
        /// The language as written.
        language: String,
    },

    /// A capture declares an unknown node class.
    #[error("rule '{rule}' declares capture ${name} with unknown class '{class}'")]
    CaptureClass {
        /// Identifier of the rule.
        rule: String,
        /// Capture name.
        name: String,
        /// The class as written.
        class: String,
    },

    /// A rule did not compile.
    #[error("rule '{rule}' is invalid: {source}")]
    Rule {
        /// Identifier of the rule.
        rule: String,
        /// Underlying engine error.
        #[source]
        source: SyntaxError,
    },

    /// Two rules in one file share an identifier.
    #[error("rule id '{rule}' is defined more than once")]
    DuplicateRule {
        /// The repeated identifier.
        rule: String,
    },

    /// A file lists `api_names` but a rule names no subject for the guard.
    #[error("rule '{rule}' needs a subject because the rule file lists api_names")]
    MissingSubject {
        /// Identifier of the rule.
        rule: String,
    },
}

impl RuleFileError {
    pub(crate) fn rule(rule: &str, source: SyntaxError) -> Self {
        Self::Rule {
            rule: rule.to_owned(),
            source,
        }
    }
}
