//! Subcommand implementations.

use std::env;
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mender_codemod::{
    CodemodTaskResult, ComposedCodemod, Diagnostic, StdFileSystem, load_rule_files,
};
use mender_config::Config;
use mender_task::{
    CodemodTask, ProcessTransportFactory, RunnerEnv, SerializedError, TaskError, TaskInput,
    WorkerDispatcher, WorkerReply, worker,
};
use serde::Serialize;
use tracing::{error, info};

use crate::cli::{EditArgs, RuleArgs};
use crate::errors::AppError;

const COMMAND_TARGET: &str = "mender_cli::commands";

fn load_task(rules: &RuleArgs) -> Result<CodemodTask<ComposedCodemod>, AppError> {
    let pipeline = load_rule_files(&StdFileSystem, &rules.files)?;
    info!(
        target: COMMAND_TARGET,
        rule_files = rules.files.len(),
        stages = pipeline.len(),
        "rules loaded"
    );
    Ok(CodemodTask::new(pipeline))
}

/// Migrates one file and prints its result as a JSON line.
pub(crate) fn run_in_process<W: Write>(
    rules: &RuleArgs,
    input_file: Option<PathBuf>,
    edits: EditArgs,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let input = match input_file {
        Some(path) => TaskInput::new(path)
            .with_dry_run(edits.dry_run)
            .with_dangerous_edits(edits.apply_dangerous_edits),
        None => {
            let from_env = TaskInput::from_env(|key| env::var(key).ok())?;
            let dry_run = from_env.dry_run || edits.dry_run;
            let dangerous = from_env.apply_dangerous_edits || edits.apply_dangerous_edits;
            from_env
                .with_dry_run(dry_run)
                .with_dangerous_edits(dangerous)
        }
    };

    let task = load_task(rules)?;
    let result = task.run(&input, &RunnerEnv { fs: &StdFileSystem })?;
    write_json_line(stdout, &result)?;
    Ok(ExitCode::SUCCESS)
}

/// Serves one worker request from `stdin`.
///
/// Rules that fail to load are still answered with a failure reply so the
/// dispatcher sees the cause.
pub(crate) fn serve_worker<R: BufRead, W: Write>(
    rules: &RuleArgs,
    stdin: &mut R,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    match load_task(rules) {
        Ok(task) => {
            worker::serve(&task, &RunnerEnv { fs: &StdFileSystem }, stdin, stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(AppError::Rules(err)) => {
            error!(target: COMMAND_TARGET, error = %err, "worker rules failed to load");
            let reply = WorkerReply::failure(SerializedError::new("RuleFileError", err.to_string()));
            write_json_line(stdout, &reply)?;
            Ok(ExitCode::FAILURE)
        }
        Err(other) => Err(other),
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum FileStatus {
    Changed,
    Unchanged,
    Failed,
}

/// One line of `dispatch` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileSummary<'a> {
    path: &'a Path,
    status: FileStatus,
    errors: &'a [Diagnostic],
    warnings: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl<'a> FileSummary<'a> {
    fn new(path: &'a Path, outcome: &'a Result<CodemodTaskResult, TaskError>) -> Self {
        match outcome {
            Ok(result) => Self {
                path,
                status: if result.result.updated.is_some() {
                    FileStatus::Changed
                } else {
                    FileStatus::Unchanged
                },
                errors: &result.errors,
                warnings: &result.warnings,
                failure: None,
            },
            Err(err) => Self {
                path,
                status: FileStatus::Failed,
                errors: &[],
                warnings: &[],
                failure: Some(err.to_string()),
            },
        }
    }
}

/// Migrates every path in its own worker process and prints one summary
/// line per file, in argument order.
pub(crate) fn dispatch<W: Write>(
    config: &Config,
    rules: &RuleArgs,
    edits: EditArgs,
    paths: &[PathBuf],
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    // Workers load the same files; reject broken rules once, up front.
    load_task(rules)?;

    let program = env::current_exe().map_err(AppError::CurrentExe)?;
    let factory = ProcessTransportFactory::new(program, worker_args(config, rules));
    let inputs: Vec<TaskInput> = paths
        .iter()
        .map(|path| {
            TaskInput::new(path.as_path())
                .with_dry_run(edits.dry_run)
                .with_dangerous_edits(edits.apply_dangerous_edits)
        })
        .collect();

    let outcomes = WorkerDispatcher::new(factory).dispatch_all(&inputs, config.workers());

    let mut failed = 0;
    for (input, outcome) in inputs.iter().zip(&outcomes) {
        let summary = FileSummary::new(&input.input_file_path, outcome);
        if summary.status == FileStatus::Failed {
            failed += 1;
        }
        write_json_line(stdout, &summary)?;
    }

    info!(
        target: COMMAND_TARGET,
        files = inputs.len(),
        failed,
        "dispatch finished"
    );
    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(AppError::DispatchFailed {
            failed,
            total: inputs.len(),
        })
    }
}

fn worker_args(config: &Config, rules: &RuleArgs) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--log-filter".into(),
        config.log_filter().into(),
        "--log-format".into(),
        config.log_format().to_string().into(),
        "worker".into(),
    ];
    for file in &rules.files {
        args.push("--rules".into());
        args.push(file.as_os_str().to_owned());
    }
    args
}

fn write_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), AppError> {
    let line = serde_json::to_string(value).map_err(AppError::Serialise)?;
    writeln!(writer, "{line}")
        .and_then(|()| writer.flush())
        .map_err(AppError::Output)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn worker_arguments_forward_logging_and_rules() {
        let config = Config::default();
        let rules = RuleArgs {
            files: vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")],
        };

        let args: Vec<String> = worker_args(&config, &rules)
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            [
                "--log-filter",
                "info",
                "--log-format",
                "json",
                "worker",
                "--rules",
                "a.yaml",
                "--rules",
                "b.yaml"
            ]
        );
    }

    #[test]
    fn summaries_report_changes_and_diagnostics() {
        let mut result = CodemodTaskResult::initial("a();");
        result.result.updated = Some("b();".to_owned());
        result
            .errors
            .push(Diagnostic::new("migrate by hand").with_rule("legacy"));
        let outcome = Ok(result);

        let line = serde_json::to_string(&FileSummary::new(Path::new("grid.ts"), &outcome))
            .expect("serialise");

        assert_snapshot!(line, @r#"{"path":"grid.ts","status":"changed","errors":[{"message":"migrate by hand","rule":"legacy"}],"warnings":[]}"#);
    }

    #[test]
    fn failed_files_carry_the_failure_message() {
        let outcome = Err(TaskError::FileNotFound {
            path: PathBuf::from("gone.ts"),
        });

        let summary = FileSummary::new(Path::new("gone.ts"), &outcome);

        assert_eq!(summary.status, FileStatus::Failed);
        assert_eq!(summary.failure.as_deref(), Some("File not found: gone.ts"));
    }
}
