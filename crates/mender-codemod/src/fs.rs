//! File-system capability handed to codemods and tasks.

use std::io;
use std::path::Path;

/// Read and write access to source files.
///
/// Tasks receive the file system as a capability so tests can substitute an
/// in-memory or mocked implementation.
pub trait FileSystem: Send + Sync {
    /// Reads the whole file at `path` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replaces the contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// The host file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}
