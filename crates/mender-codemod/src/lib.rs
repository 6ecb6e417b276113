//! Codemods built on the `mender-syntax` rewrite engine.
//!
//! A [`Codemod`] turns one file's source into updated source plus error and
//! warning [`Diagnostic`]s. This crate provides:
//!
//! - [`RuleCodemod`], which parses a file, applies a rule set and prints it
//! - [`ComposedCodemod`], which threads a file through several codemods in
//!   order and accumulates their diagnostics into a [`CodemodTaskResult`]
//! - [`RuleFile`], which loads rule sets from declarative YAML
//! - the [`FileSystem`] capability handed to codemods and tasks

mod codemod;
mod compose;
mod diagnostic;
mod error;
mod fs;
mod rule_codemod;
mod rules_file;

#[cfg(test)]
mod tests;

pub use codemod::{Codemod, CodemodOptions, CodemodOutput, FileInput, FnCodemod};
pub use compose::{CodemodTaskResult, ComposedCodemod, SourceUpdate};
pub use diagnostic::{Diagnostic, Location};
pub use error::{CodemodError, RuleFileError};
pub use fs::{FileSystem, StdFileSystem};
pub use rule_codemod::RuleCodemod;
pub use rules_file::{DeprecationRule, ReplacementRule, RuleFile, load_rule_files};
