//! Task input and its validation.
//!
//! Input arrives as a JSON message (worker mode), as environment variables
//! or as command-line flags (in-process mode). Every path validates the
//! whole input before the task touches the file system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TaskError;

/// Environment variable naming the file to migrate.
pub const INPUT_FILE_VAR: &str = "INPUT_FILE";
/// Environment variable enabling dry runs.
pub const DRY_RUN_VAR: &str = "DRY_RUN";
/// Environment variable enabling dangerous edits.
pub const APPLY_DANGEROUS_EDITS_VAR: &str = "APPLY_DANGEROUS_EDITS";

const INPUT_FILE_PATH_KEY: &str = "inputFilePath";
const DRY_RUN_KEY: &str = "dryRun";
const APPLY_DANGEROUS_EDITS_KEY: &str = "applyDangerousEdits";

/// What to migrate and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// File to migrate.
    pub input_file_path: PathBuf,
    /// Compute the result without writing the file.
    pub dry_run: bool,
    /// Apply replacements marked as dangerous.
    pub apply_dangerous_edits: bool,
}

impl TaskInput {
    /// Creates an input for `path` with every switch off.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            input_file_path: path.into(),
            dry_run: false,
            apply_dangerous_edits: false,
        }
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables dangerous edits.
    #[must_use]
    pub const fn with_dangerous_edits(mut self, apply: bool) -> Self {
        self.apply_dangerous_edits = apply;
        self
    }

    /// Parses and validates one JSON input message.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidInput`] if the message is not JSON, is not
    /// an object, or has a missing or mistyped field.
    pub fn from_message(line: &str) -> Result<Self, TaskError> {
        let value: Value = serde_json::from_str(line.trim())
            .map_err(|err| TaskError::invalid_input(format!("input is not valid JSON: {err}")))?;
        Self::from_value(&value)
    }

    /// Validates an already parsed JSON input.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidInput`] if the value is not an object or
    /// has a missing or mistyped field.
    pub fn from_value(value: &Value) -> Result<Self, TaskError> {
        let fields = value
            .as_object()
            .ok_or_else(|| TaskError::invalid_input("input must be a JSON object"))?;

        let path = fields
            .get(INPUT_FILE_PATH_KEY)
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                TaskError::invalid_input(format!("{INPUT_FILE_PATH_KEY} must be a non-empty string"))
            })?;

        Ok(Self {
            input_file_path: PathBuf::from(path),
            dry_run: boolean_field(fields, DRY_RUN_KEY)?,
            apply_dangerous_edits: boolean_field(fields, APPLY_DANGEROUS_EDITS_KEY)?,
        })
    }

    /// Reads the input from environment variables through `lookup`.
    ///
    /// `INPUT_FILE` is required. `DRY_RUN` and `APPLY_DANGEROUS_EDITS` are
    /// read with [`flag_enabled`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidInput`] if `INPUT_FILE` is unset or empty.
    pub fn from_env<F>(lookup: F) -> Result<Self, TaskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(INPUT_FILE_VAR)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                TaskError::invalid_input(format!("{INPUT_FILE_VAR} must name the file to migrate"))
            })?;

        Ok(Self {
            input_file_path: PathBuf::from(path),
            dry_run: flag_enabled(lookup(DRY_RUN_VAR).as_deref()),
            apply_dangerous_edits: flag_enabled(lookup(APPLY_DANGEROUS_EDITS_VAR).as_deref()),
        })
    }
}

/// Interprets an environment flag.
///
/// Absent, empty, `0` and `false` (in any case) are off; anything else is on.
#[must_use]
pub fn flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|raw| {
        let trimmed = raw.trim();
        !(trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("false"))
    })
}

fn boolean_field(fields: &Map<String, Value>, key: &str) -> Result<bool, TaskError> {
    fields
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| TaskError::invalid_input(format!("{key} must be a boolean")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    #[test]
    fn valid_messages_parse() {
        let input = TaskInput::from_message(
            r#"{"inputFilePath":"src/a.ts","dryRun":true,"applyDangerousEdits":false}"#,
        )
        .expect("valid");

        assert_eq!(input, TaskInput::new("src/a.ts").with_dry_run(true));
    }

    #[rstest]
    #[case(r#"{"inputFilePath":"a.ts","applyDangerousEdits":false}"#, "dryRun must be a boolean")]
    #[case(r#"{"inputFilePath":"a.ts","dryRun":"yes","applyDangerousEdits":false}"#, "dryRun must be a boolean")]
    #[case(r#"{"inputFilePath":"a.ts","dryRun":false}"#, "applyDangerousEdits must be a boolean")]
    #[case(r#"{"inputFilePath":7,"dryRun":false,"applyDangerousEdits":false}"#, "inputFilePath must be a non-empty string")]
    #[case(r#"{"inputFilePath":"","dryRun":false,"applyDangerousEdits":false}"#, "inputFilePath must be a non-empty string")]
    #[case("[1, 2]", "input must be a JSON object")]
    #[case("{", "input is not valid JSON")]
    fn malformed_messages_are_rejected(#[case] message: &str, #[case] expected: &str) {
        let err = TaskInput::from_message(message).expect_err("invalid");
        assert!(matches!(err, TaskError::InvalidInput { .. }));
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(""), false)]
    #[case(Some("0"), false)]
    #[case(Some("false"), false)]
    #[case(Some("FALSE"), false)]
    #[case(Some("1"), true)]
    #[case(Some("true"), true)]
    #[case(Some("yes"), true)]
    fn flags_follow_environment_conventions(#[case] value: Option<&str>, #[case] expected: bool) {
        assert_eq!(flag_enabled(value), expected);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_input_reads_all_variables() {
        let input = TaskInput::from_env(env(&[
            (INPUT_FILE_VAR, "grid.ts"),
            (DRY_RUN_VAR, "1"),
            (APPLY_DANGEROUS_EDITS_VAR, "0"),
        ]))
        .expect("input");

        assert_eq!(input, TaskInput::new("grid.ts").with_dry_run(true));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[(INPUT_FILE_VAR, "")])]
    fn environment_input_requires_a_file(#[case] pairs: &[(&str, &str)]) {
        let err = TaskInput::from_env(env(pairs)).expect_err("missing file");
        assert!(matches!(err, TaskError::InvalidInput { .. }));
    }
}
