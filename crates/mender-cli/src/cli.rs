//! Command-line arguments for the `mender` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mender_config::ConfigArgs;

/// Structural API migrations driven by declarative rule files.
#[derive(Parser, Debug)]
#[command(name = "mender", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: ConfigArgs,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Migrates one file in-process.
    ///
    /// Without `--input-file` the file is taken from `INPUT_FILE`, and the
    /// flags fall back to `DRY_RUN` and `APPLY_DANGEROUS_EDITS`.
    Run {
        #[command(flatten)]
        rules: RuleArgs,
        /// File to migrate.
        #[arg(long, value_name = "PATH")]
        input_file: Option<PathBuf>,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Answers one JSON request read from stdin with one JSON reply.
    Worker {
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Migrates many files, each in its own worker process.
    Dispatch {
        #[command(flatten)]
        rules: RuleArgs,
        #[command(flatten)]
        edits: EditArgs,
        /// Files to migrate.
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RuleArgs {
    /// Rule file to apply; repeat to compose several files in order.
    #[arg(long = "rules", value_name = "FILE", required = true)]
    pub(crate) files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Copy)]
pub(crate) struct EditArgs {
    /// Computes the migration without writing files.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Applies replacements marked as dangerous.
    #[arg(long)]
    pub(crate) apply_dangerous_edits: bool,
}
