//! Task and worker scenarios run against in-memory doubles.


use std::io;
use std::path::Path;

use mender_codemod::{CodemodOutput, Diagnostic, FileSystem, FnCodemod};
use mockall::mock;

mock! {
    pub Files {}
    impl FileSystem for Files {
        fn read_to_string(&self, path: &Path) -> io::Result<String>;
        fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
    }
}

/// Renames `oldApi` to `newApi` and flags every `legacy` token.
pub(crate) fn renaming_codemod() -> impl mender_codemod::Codemod {
    FnCodemod::new("rename", |input, _| {
        let errors = input
            .source
            .contains("legacy")
            .then(|| Diagnostic::new("legacy must be migrated by hand").with_path(input.path))
            .into_iter()
            .collect();
        Ok(CodemodOutput {
            source: Some(input.source.replace("oldApi", "newApi")),
            errors,
            warnings: Vec::new(),
        })
    })
}

/// A file system holding one readable file and refusing every write.
pub(crate) fn read_only(path: &'static str, contents: &'static str) -> MockFiles {
    let mut files = MockFiles::new();
    files
        .expect_read_to_string()
        .returning(move |requested: &Path| {
            if requested == Path::new(path) {
                Ok(contents.to_owned())
            } else {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        });
    files.expect_write().never();
    files
}
