//! Diagnostics reported by codemods.

use std::path::{Path, PathBuf};

use mender_syntax::{Finding, Position};
use serde::{Deserialize, Serialize};

/// A one-based source location carried by a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
}

impl From<Position> for Location {
    fn from(position: Position) -> Self {
        Self {
            line: position.line,
            column: position.column,
        }
    }
}

/// A message about one file, optionally located and attributed to a rule.
///
/// Whether a diagnostic is an error or a warning is decided by the list it
/// is stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Identifier of the rule that produced the diagnostic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// File the diagnostic refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Location in the text the producing stage operated on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Zero-based index of the composed stage that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
}

impl Diagnostic {
    /// Creates an unlocated diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rule: None,
            path: None,
            location: None,
            stage: None,
        }
    }

    /// Converts a rewrite finding for the file at `path`.
    #[must_use]
    pub fn from_finding(finding: &Finding, path: &Path) -> Self {
        Self {
            message: finding.message.clone(),
            rule: Some(finding.rule_id.clone()),
            path: Some(path.to_path_buf()),
            location: finding.span.as_ref().map(|span| span.start.into()),
            stage: None,
        }
    }

    /// Attributes the diagnostic to `rule`.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Attaches a file path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches a location.
    #[must_use]
    pub const fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Records the producing stage unless one was recorded already.
    #[must_use]
    pub const fn in_stage(mut self, stage: usize) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage);
        }
        self
    }
}
