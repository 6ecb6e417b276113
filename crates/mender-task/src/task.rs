//! Running a codemod over one file.

use std::io;

use mender_codemod::{
    Codemod, CodemodOptions, CodemodTaskResult, FileInput, FileSystem, SourceUpdate,
};
use tracing::{debug, info};

use crate::error::TaskError;
use crate::input::TaskInput;

const RUNNER_TARGET: &str = "mender_task::runner";

/// Capabilities a task runs with.
#[derive(Clone, Copy)]
pub struct RunnerEnv<'a> {
    /// Where the input file is read from and written to.
    pub fs: &'a dyn FileSystem,
}

impl std::fmt::Debug for RunnerEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerEnv").finish_non_exhaustive()
    }
}

/// A single-file migration task.
///
/// Running a task reads the file once and, unless the input asks for a dry
/// run or nothing changed, writes it back exactly once.
#[derive(Debug)]
pub struct CodemodTask<C> {
    codemod: C,
}

impl<C: Codemod> CodemodTask<C> {
    /// Wraps `codemod`.
    #[must_use]
    pub const fn new(codemod: C) -> Self {
        Self { codemod }
    }

    /// Returns the wrapped codemod.
    #[must_use]
    pub const fn codemod(&self) -> &C {
        &self.codemod
    }

    /// Migrates the file named by `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::FileNotFound`] or [`TaskError::Read`] if the file
    /// cannot be read, [`TaskError::Codemod`] if the codemod fails, and
    /// [`TaskError::Write`] if the updated source cannot be written.
    pub fn run(
        &self,
        input: &TaskInput,
        env: &RunnerEnv<'_>,
    ) -> Result<CodemodTaskResult, TaskError> {
        let path = input.input_file_path.as_path();
        let source = env.fs.read_to_string(path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                TaskError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                TaskError::Read {
                    path: path.to_path_buf(),
                    source: err.into(),
                }
            }
        })?;

        let options = CodemodOptions {
            apply_dangerous_edits: input.apply_dangerous_edits,
            fs: env.fs,
        };
        let output = self
            .codemod
            .apply(&FileInput::new(path, &source), &options)
            .map_err(|source| TaskError::Codemod {
                path: path.to_path_buf(),
                source,
            })?;

        let updated = output.source.filter(|updated| *updated != source);
        if let Some(contents) = updated.as_deref() {
            if input.dry_run {
                debug!(
                    target: RUNNER_TARGET,
                    path = %path.display(),
                    "dry run, leaving changed file untouched"
                );
            } else {
                env.fs
                    .write(path, contents)
                    .map_err(|err| TaskError::Write {
                        path: path.to_path_buf(),
                        source: err.into(),
                    })?;
            }
        }

        info!(
            target: RUNNER_TARGET,
            path = %path.display(),
            codemod = self.codemod.name(),
            changed = updated.is_some(),
            dry_run = input.dry_run,
            errors = output.errors.len(),
            warnings = output.warnings.len(),
            "migrated file"
        );

        Ok(CodemodTaskResult {
            result: SourceUpdate { source, updated },
            errors: output.errors,
            warnings: output.warnings,
        })
    }

    /// Reads the input from the environment and runs the task in-process.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidInput`] if the environment does not name
    /// a file, before any I/O, or any error from [`CodemodTask::run`].
    pub fn run_from_env<F>(
        &self,
        lookup: F,
        env: &RunnerEnv<'_>,
    ) -> Result<CodemodTaskResult, TaskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = TaskInput::from_env(lookup)?;
        self.run(&input, env)
    }
}
