//! The codemod abstraction.
//!
//! A codemod turns one file's source into updated source plus diagnostics.
//! It is stateless across invocations: everything it needs arrives in the
//! [`FileInput`] and [`CodemodOptions`].

use std::fmt;
use std::path::Path;

use crate::diagnostic::Diagnostic;
use crate::error::CodemodError;
use crate::fs::FileSystem;

/// The file a codemod operates on.
#[derive(Debug, Clone, Copy)]
pub struct FileInput<'a> {
    /// Path of the file, used for language detection and diagnostics.
    pub path: &'a Path,
    /// Current text of the file.
    pub source: &'a str,
}

impl<'a> FileInput<'a> {
    /// Creates a file input.
    #[must_use]
    pub const fn new(path: &'a Path, source: &'a str) -> Self {
        Self { path, source }
    }
}

/// Per-run switches and capabilities.
#[derive(Clone, Copy)]
pub struct CodemodOptions<'a> {
    /// Apply replacements marked as dangerous.
    pub apply_dangerous_edits: bool,
    /// File system for codemods that need to consult other files.
    pub fs: &'a dyn FileSystem,
}

impl fmt::Debug for CodemodOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodemodOptions")
            .field("apply_dangerous_edits", &self.apply_dangerous_edits)
            .finish_non_exhaustive()
    }
}

/// What one codemod produced for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodemodOutput {
    /// The rewritten source, or `None` when the codemod changed nothing.
    pub source: Option<String>,
    /// Usages that need manual attention.
    pub errors: Vec<Diagnostic>,
    /// Changes that should be reviewed.
    pub warnings: Vec<Diagnostic>,
}

impl CodemodOutput {
    /// An output with no changes and no diagnostics.
    #[must_use]
    pub const fn unchanged() -> Self {
        Self {
            source: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// A source-to-source transformation of one file.
pub trait Codemod: Send + Sync {
    /// Short name used in logs and stage errors.
    fn name(&self) -> &str;

    /// Transforms `input`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be transformed at all. Usages
    /// that merely need manual attention are reported as diagnostics.
    fn apply(
        &self,
        input: &FileInput<'_>,
        options: &CodemodOptions<'_>,
    ) -> Result<CodemodOutput, CodemodError>;
}

impl<C: Codemod + ?Sized> Codemod for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(
        &self,
        input: &FileInput<'_>,
        options: &CodemodOptions<'_>,
    ) -> Result<CodemodOutput, CodemodError> {
        (**self).apply(input, options)
    }
}

/// A codemod backed by a closure.
pub struct FnCodemod<F> {
    name: String,
    apply: F,
}

impl<F> FnCodemod<F>
where
    F: Fn(&FileInput<'_>, &CodemodOptions<'_>) -> Result<CodemodOutput, CodemodError>
        + Send
        + Sync,
{
    /// Wraps `apply` under `name`.
    pub fn new(name: impl Into<String>, apply: F) -> Self {
        Self {
            name: name.into(),
            apply,
        }
    }
}

impl<F> fmt::Debug for FnCodemod<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodemod")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Codemod for FnCodemod<F>
where
    F: Fn(&FileInput<'_>, &CodemodOptions<'_>) -> Result<CodemodOutput, CodemodError>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        input: &FileInput<'_>,
        options: &CodemodOptions<'_>,
    ) -> Result<CodemodOutput, CodemodError> {
        (self.apply)(input, options)
    }
}
