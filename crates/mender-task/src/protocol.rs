//! Wire types for the one-shot worker protocol.
//!
//! The dispatcher writes one [`TaskInput`](crate::TaskInput) as a JSON line
//! to the worker's stdin and closes it. The worker answers with one
//! [`WorkerReply`] line on stdout and exits. Worker stderr carries logs only.

use std::collections::BTreeMap;
use std::error::Error as _;

use mender_codemod::CodemodTaskResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::TaskError;

/// An error flattened into plain data so it can cross a process boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedError {
    /// Kind of error, such as `FileNotFound`.
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// The chain of underlying causes, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Structured fields of the error.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl SerializedError {
    /// Creates an error with no cause chain or properties.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            properties: BTreeMap::new(),
        }
    }
}

impl From<&TaskError> for SerializedError {
    fn from(error: &TaskError) -> Self {
        let mut causes = Vec::new();
        let mut cause = error.source();
        while let Some(current) = cause {
            causes.push(format!("caused by: {current}"));
            cause = current.source();
        }

        let mut properties = BTreeMap::new();
        if let Some(path) = error.path() {
            properties.insert(
                "path".to_owned(),
                Value::String(path.display().to_string()),
            );
        }
        if let TaskError::Worker { error: remote, .. } = error {
            properties.insert("workerError".to_owned(), Value::String(remote.name.clone()));
        }

        Self {
            name: error.name().to_owned(),
            message: error.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
            properties,
        }
    }
}

/// The single line a worker writes in answer to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReply {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<CodemodTaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<SerializedError>,
}

impl WorkerReply {
    /// A reply carrying the task result.
    #[must_use]
    pub const fn success(value: CodemodTaskResult) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }

    /// A reply carrying a failure.
    #[must_use]
    pub const fn failure(error: SerializedError) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
        }
    }

    /// Returns whether the worker completed the task.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Converts the reply into the task outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::Failed`] for a failed reply, or
    /// [`ReplyError::Malformed`] when the success flag and payload disagree.
    pub fn into_result(self) -> Result<CodemodTaskResult, ReplyError> {
        match (self.success, self.value, self.error) {
            (true, Some(value), _) => Ok(value),
            (false, _, Some(error)) => Err(ReplyError::Failed(error)),
            (true, None, _) => Err(ReplyError::Malformed(
                "successful reply carries no value".to_owned(),
            )),
            (false, _, None) => Err(ReplyError::Malformed(
                "failed reply carries no error".to_owned(),
            )),
        }
    }

    /// Parses a reply line.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Protocol`] if the line is not a valid reply.
    pub fn parse(line: &str) -> Result<Self, TaskError> {
        serde_json::from_str(line.trim())
            .map_err(|err| TaskError::protocol(format!("invalid worker reply: {err}")))
    }
}

/// Why a reply did not carry a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    /// The worker reported a failure.
    #[error("{}: {}", .0.name, .0.message)]
    Failed(SerializedError),
    /// The reply was inconsistent.
    #[error("{0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn success_replies_omit_the_error() {
        let reply = WorkerReply::success(CodemodTaskResult::initial("a;"));
        let json = serde_json::to_string(&reply).expect("serialise");
        assert_snapshot!(json, @r#"{"success":true,"value":{"result":{"source":"a;","updated":null},"errors":[],"warnings":[]}}"#);
    }

    #[test]
    fn missing_files_flatten_with_their_path() {
        let error = TaskError::FileNotFound {
            path: PathBuf::from("src/grid.ts"),
        };

        let flattened = SerializedError::from(&error);

        assert_eq!(flattened.name, "FileNotFound");
        assert_eq!(flattened.message, "File not found: src/grid.ts");
        assert_eq!(flattened.stack, None);
        assert_eq!(
            flattened.properties.get("path"),
            Some(&Value::String("src/grid.ts".to_owned()))
        );
    }

    #[test]
    fn causes_are_recorded_in_the_stack() {
        let error = TaskError::Read {
            path: PathBuf::from("a.ts"),
            source: Arc::new(std::io::Error::other("disk on fire")),
        };

        let flattened = SerializedError::from(&error);

        assert_eq!(flattened.stack.as_deref(), Some("caused by: disk on fire"));
    }

    #[test]
    fn failure_replies_round_trip_into_errors() {
        let line = serde_json::to_string(&WorkerReply::failure(SerializedError::new(
            "InvalidInput",
            "dryRun must be a boolean",
        )))
        .expect("serialise");

        let result = WorkerReply::parse(&line).expect("parse").into_result();

        assert!(matches!(result, Err(ReplyError::Failed(ref e)) if e.name == "InvalidInput"));
    }

    #[test]
    fn inconsistent_replies_are_malformed() {
        let reply = WorkerReply::parse(r#"{"success":true}"#).expect("parse");
        assert!(matches!(reply.into_result(), Err(ReplyError::Malformed(_))));
        assert!(WorkerReply::parse("not json").is_err());
    }
}
