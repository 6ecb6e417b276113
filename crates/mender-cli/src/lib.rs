//! Runtime for the `mender` binary.
//!
//! [`run`] parses arguments, resolves configuration, installs logging and
//! executes one subcommand against the streams it is given, so tests can
//! drive the whole binary with in-memory buffers.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

mod cli;
mod commands;
mod errors;
pub mod telemetry;

use cli::{Cli, CliCommand};
use errors::AppError;

const CLI_TARGET: &str = "mender_cli";
const USAGE_EXIT: u8 = 2;

/// Runs the CLI with the given arguments and streams.
///
/// Results and worker replies are written to `stdout`; usage errors and
/// failures are reported on `stderr`.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    match execute(args, stdin, stdout) {
        Ok(code) => code,
        Err(AppError::CliUsage(usage)) => {
            let rendered = usage.render();
            if usage.use_stderr() {
                drop(write!(stderr, "{rendered}"));
                ExitCode::from(USAGE_EXIT)
            } else {
                drop(write!(stdout, "{rendered}"));
                ExitCode::SUCCESS
            }
        }
        Err(failure) => {
            error!(target: CLI_TARGET, error = %failure, "command failed");
            drop(writeln!(stderr, "{failure}"));
            ExitCode::FAILURE
        }
    }
}

fn execute<I, R, W>(args: I, stdin: &mut R, stdout: &mut W) -> Result<ExitCode, AppError>
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
{
    let cli = Cli::try_parse_from(args).map_err(AppError::CliUsage)?;
    let config = cli.config.resolve()?;
    telemetry::initialise(&config)?;
    debug!(
        target: CLI_TARGET,
        workers = config.workers().get(),
        log_format = %config.log_format(),
        "configuration resolved"
    );

    match cli.command {
        CliCommand::Run {
            rules,
            input_file,
            edits,
        } => commands::run_in_process(&rules, input_file, edits, stdout),
        CliCommand::Worker { rules } => commands::serve_worker(&rules, stdin, stdout),
        CliCommand::Dispatch {
            rules,
            edits,
            paths,
        } => commands::dispatch(&config, &rules, edits, &paths, stdout),
    }
}

#[cfg(test)]
mod tests;
