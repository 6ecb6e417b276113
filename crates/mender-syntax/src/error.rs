//! Error types for syntax tree, pattern, and rewrite operations.
//!
//! Matching never fails: a pattern that does not apply yields `None`. The
//! variants below cover construction-time mistakes (bad patterns, templates
//! referencing unknown placeholders) and misuse of tree locations.

use thiserror::Error;

use crate::language::SupportedLanguage;
use crate::tree::NodeId;

/// Errors from syntax tree and rewrite operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyntaxError {
    /// Failed to initialise the Tree-sitter parser for a language.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInitError {
        /// The language that failed to initialise.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// Failed to parse source code.
    #[error("failed to parse {language}: {message}")]
    ParseError {
        /// The language that failed to parse.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// Pattern compilation failed.
    #[error("invalid pattern for {language}: {message}")]
    PatternCompileError {
        /// The language the pattern was compiled for.
        language: SupportedLanguage,
        /// Description of the compilation failure.
        message: String,
    },

    /// Pattern or template contains invalid metavariable syntax.
    #[error("invalid metavariable syntax: {message}")]
    InvalidMetavariable {
        /// Description of the metavariable error.
        message: String,
    },

    /// Invalid replacement template.
    #[error("invalid replacement template: {message}")]
    InvalidTemplate {
        /// Description of the template error.
        message: String,
    },

    /// A template was rendered without a value for one of its placeholders.
    #[error("template placeholder ${name} has no bound value")]
    MissingBinding {
        /// Name of the unbound placeholder.
        name: String,
    },

    /// A tree location no longer refers to a live node.
    #[error("tree location {node} is stale or out of range")]
    StaleLocation {
        /// The offending location.
        node: NodeId,
    },

    /// A structural edit was rejected.
    #[error("invalid tree edit: {message}")]
    InvalidEdit {
        /// Description of the rejected edit.
        message: String,
    },
}

impl SyntaxError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParserInitError {
            language,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParseError {
            language,
            message: message.into(),
        }
    }

    /// Creates a pattern compilation error.
    #[must_use]
    pub fn pattern_compile(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::PatternCompileError {
            language,
            message: message.into(),
        }
    }

    /// Creates an invalid metavariable error.
    #[must_use]
    pub fn invalid_metavariable(message: impl Into<String>) -> Self {
        Self::InvalidMetavariable {
            message: message.into(),
        }
    }

    /// Creates an invalid template error.
    #[must_use]
    pub fn invalid_template(message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            message: message.into(),
        }
    }

    /// Creates a missing binding error.
    #[must_use]
    pub fn missing_binding(name: impl Into<String>) -> Self {
        Self::MissingBinding { name: name.into() }
    }

    /// Creates a stale location error.
    #[must_use]
    pub const fn stale_location(node: NodeId) -> Self {
        Self::StaleLocation { node }
    }

    /// Creates an invalid edit error.
    #[must_use]
    pub fn invalid_edit(message: impl Into<String>) -> Self {
        Self::InvalidEdit {
            message: message.into(),
        }
    }
}
