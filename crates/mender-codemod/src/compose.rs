//! Composition of several codemods into one pipeline.
//!
//! Stages run in order. Each stage sees the output of the last stage that
//! changed the file, and every diagnostic is tagged with the index of the
//! stage that produced it, so its location refers to the text that stage
//! operated on.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codemod::{Codemod, CodemodOptions, CodemodOutput, FileInput};
use crate::diagnostic::Diagnostic;
use crate::error::CodemodError;

const COMPOSE_TARGET: &str = "mender_codemod::compose";

/// Original and updated text of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUpdate {
    /// Text before any codemod ran.
    pub source: String,
    /// Text after the codemods ran, or `None` when nothing changed.
    pub updated: Option<String>,
}

/// Outcome of running a codemod pipeline over one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodemodTaskResult {
    /// Original and updated text.
    pub result: SourceUpdate,
    /// Usages that need manual attention, in stage order.
    pub errors: Vec<Diagnostic>,
    /// Changes that should be reviewed, in stage order.
    pub warnings: Vec<Diagnostic>,
}

impl CodemodTaskResult {
    /// The state before any stage has run.
    #[must_use]
    pub fn initial(source: impl Into<String>) -> Self {
        Self {
            result: SourceUpdate {
                source: source.into(),
                updated: None,
            },
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Text the next stage should operate on.
    #[must_use]
    pub fn current(&self) -> &str {
        self.result
            .updated
            .as_deref()
            .unwrap_or(&self.result.source)
    }

    /// Returns whether any stage changed the file.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.result
            .updated
            .as_ref()
            .is_some_and(|updated| *updated != self.result.source)
    }

    /// Folds one stage's output into the accumulated state.
    pub fn absorb(&mut self, stage: usize, output: CodemodOutput) {
        if let Some(source) = output.source {
            self.result.updated = Some(source);
        }
        self.errors
            .extend(output.errors.into_iter().map(|d| d.in_stage(stage)));
        self.warnings
            .extend(output.warnings.into_iter().map(|d| d.in_stage(stage)));
    }
}

/// A codemod that runs other codemods in sequence.
#[derive(Default)]
pub struct ComposedCodemod {
    name: String,
    stages: Vec<Box<dyn Codemod>>,
}

impl std::fmt::Debug for ComposedCodemod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedCodemod")
            .field("name", &self.name)
            .field(
                "stages",
                &self.stages.iter().map(|stage| stage.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ComposedCodemod {
    /// Creates an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn then(mut self, codemod: impl Codemod + 'static) -> Self {
        self.stages.push(Box::new(codemod));
        self
    }

    /// Appends an already boxed stage.
    pub fn push(&mut self, codemod: Box<dyn Codemod>) {
        self.stages.push(codemod);
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns whether the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage and returns the accumulated result.
    ///
    /// # Errors
    ///
    /// Returns [`CodemodError::Stage`] for the first stage that fails.
    pub fn run(
        &self,
        input: &FileInput<'_>,
        options: &CodemodOptions<'_>,
    ) -> Result<CodemodTaskResult, CodemodError> {
        let mut state = CodemodTaskResult::initial(input.source);
        for (index, stage) in self.stages.iter().enumerate() {
            let output = stage
                .apply(&FileInput::new(input.path, state.current()), options)
                .map_err(|err| err.in_stage(index, stage.name()))?;
            debug!(
                target: COMPOSE_TARGET,
                pipeline = %self.name,
                stage = index,
                codemod = stage.name(),
                changed = output.source.is_some(),
                errors = output.errors.len(),
                warnings = output.warnings.len(),
                "codemod stage finished"
            );
            state.absorb(index, output);
        }
        Ok(state)
    }
}

impl Codemod for ComposedCodemod {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        input: &FileInput<'_>,
        options: &CodemodOptions<'_>,
    ) -> Result<CodemodOutput, CodemodError> {
        let state = self.run(input, options)?;
        Ok(CodemodOutput {
            source: state.result.updated,
            errors: state.errors,
            warnings: state.warnings,
        })
    }
}
