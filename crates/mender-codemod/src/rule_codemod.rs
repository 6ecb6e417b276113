//! Codemods backed by a [`RuleSet`].

use mender_syntax::{
    AcceptAll, Parser, RewriteOptions, RuleRewriter, RuleSet, SemanticGuard, Severity,
    SupportedLanguage,
};
use tracing::{debug, trace};

use crate::codemod::{Codemod, CodemodOptions, CodemodOutput, FileInput};
use crate::diagnostic::Diagnostic;
use crate::error::CodemodError;

const RULE_CODEMOD_TARGET: &str = "mender_codemod::rule_codemod";

/// Parses a file, rewrites it with a rule set and prints it back.
///
/// Files whose extension names a different language than the rule set are
/// passed through untouched. Files with no recognised extension are parsed
/// with the rule set's language.
#[derive(Debug)]
pub struct RuleCodemod<G = AcceptAll> {
    name: String,
    rewriter: RuleRewriter<G>,
}

impl RuleCodemod<AcceptAll> {
    /// Creates a codemod that applies `rules` without a semantic guard.
    pub fn new(name: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            rewriter: RuleRewriter::new(rules),
        }
    }
}

impl<G: SemanticGuard> RuleCodemod<G> {
    /// Creates a codemod that consults `guard` before any rule acts.
    pub fn with_guard(name: impl Into<String>, rules: RuleSet, guard: G) -> Self {
        Self {
            name: name.into(),
            rewriter: RuleRewriter::with_guard(rules, guard),
        }
    }

    /// Returns the language the rules target.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.rewriter.rules().language()
    }
}

impl<G: SemanticGuard> Codemod for RuleCodemod<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        input: &FileInput<'_>,
        options: &CodemodOptions<'_>,
    ) -> Result<CodemodOutput, CodemodError> {
        let language = self.language();
        if let Some(detected) = SupportedLanguage::from_path(input.path)
            && detected != language
        {
            trace!(
                target: RULE_CODEMOD_TARGET,
                codemod = %self.name,
                path = %input.path.display(),
                %detected,
                "skipping file written in another language"
            );
            return Ok(CodemodOutput::unchanged());
        }

        let mut tree = Parser::for_path(language, input.path)
            .and_then(|mut parser| parser.parse(input.source))
            .map_err(|err| CodemodError::syntax(input.path, err))?;
        if let Some(first) = tree.errors().first() {
            return Err(CodemodError::Unparsable {
                path: input.path.to_path_buf(),
                position: first.position,
                message: first.message.clone(),
            });
        }

        let report = self
            .rewriter
            .rewrite(
                &mut tree,
                RewriteOptions {
                    apply_dangerous_edits: options.apply_dangerous_edits,
                },
            )
            .map_err(|err| CodemodError::syntax(input.path, err))?;

        debug!(
            target: RULE_CODEMOD_TARGET,
            codemod = %self.name,
            path = %input.path.display(),
            applied = report.applied,
            findings = report.findings.len(),
            "rewrote file"
        );

        let mut output = CodemodOutput {
            source: report.changed().then(|| tree.print()),
            ..CodemodOutput::unchanged()
        };
        for finding in &report.findings {
            let diagnostic = Diagnostic::from_finding(finding, input.path);
            match finding.severity {
                Severity::Error => output.errors.push(diagnostic),
                Severity::Warning => output.warnings.push(diagnostic),
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use mender_syntax::{CaptureSet, Deprecation, NameListGuard, Pattern, Replacement, TextTemplate};
    use rstest::rstest;

    use super::*;
    use crate::fs::StdFileSystem;

    const TS: SupportedLanguage = SupportedLanguage::TypeScript;

    fn grid_rules() -> RuleSet {
        let captures = CaptureSet::new().expression("API").expression("VALUE");
        let setter = Replacement::new(
            "set-dom-layout",
            Pattern::compile(TS, "$API.setDomLayout($VALUE)", &captures).expect("pattern"),
            TextTemplate::compile(TS, "$API.setGridOption(\"domLayout\", $VALUE)")
                .expect("template"),
        )
        .expect("replacement")
        .with_subject("API")
        .expect("subject");
        let overlay = Deprecation::new(
            "show-loading-overlay",
            Pattern::compile(TS, "$API.showLoadingOverlay()", &captures).expect("pattern"),
            "showLoadingOverlay() must be migrated manually",
        )
        .with_subject("API")
        .expect("subject");
        RuleSet::new(TS).replacement(setter).deprecation(overlay)
    }

    fn run(codemod: &impl Codemod, path: &str, source: &str) -> Result<CodemodOutput, CodemodError> {
        let options = CodemodOptions {
            apply_dangerous_edits: false,
            fs: &StdFileSystem,
        };
        codemod.apply(&FileInput::new(Path::new(path), source), &options)
    }

    #[test]
    fn rewritten_files_return_new_source() {
        let codemod = RuleCodemod::with_guard("grid", grid_rules(), NameListGuard::new(["gridApi"]));
        let output = run(&codemod, "grid.ts", "gridApi.setDomLayout(value);").expect("apply");

        assert_eq!(
            output.source.as_deref(),
            Some("gridApi.setGridOption(\"domLayout\", value);")
        );
        assert!(output.errors.is_empty());
    }

    #[test]
    fn deprecations_become_located_errors() {
        let codemod = RuleCodemod::new("grid", grid_rules());
        let output = run(&codemod, "grid.ts", "x;\ngridApi.showLoadingOverlay();").expect("apply");

        assert_eq!(output.source, None);
        let error = output.errors.first().expect("one error");
        assert_eq!(error.rule.as_deref(), Some("show-loading-overlay"));
        assert_eq!(error.path.as_deref(), Some(Path::new("grid.ts")));
        assert_eq!(error.location.map(|l| (l.line, l.column)), Some((2, 1)));
    }

    #[rstest]
    #[case("module.py")]
    #[case("lib.rs")]
    fn files_in_other_languages_are_skipped(#[case] path: &str) {
        let codemod = RuleCodemod::new("grid", grid_rules());
        let output = run(&codemod, path, "gridApi.setDomLayout(value);").expect("apply");
        assert_eq!(output, CodemodOutput::unchanged());
    }

    #[test]
    fn unknown_extensions_use_the_rule_language() {
        let codemod = RuleCodemod::new("grid", grid_rules());
        let output = run(&codemod, "grid.vue-script", "api.setDomLayout(v);").expect("apply");
        assert!(output.source.is_some());
    }

    #[rstest]
    #[case("grid.ts", "const api = <GridApi>params.api;\napi.setDomLayout(value);")]
    #[case("grid.cts", "const pick = <T>(x: T) => x;\napi.setDomLayout(value);")]
    fn typescript_only_syntax_still_migrates(#[case] path: &str, #[case] source: &str) {
        let codemod = RuleCodemod::new("grid", grid_rules());

        let output = run(&codemod, path, source).expect("apply");

        let updated = output.source.expect("rewritten");
        assert!(updated.ends_with("api.setGridOption(\"domLayout\", value);"));
    }

    #[test]
    fn tsx_files_keep_jsx_support() {
        let codemod = RuleCodemod::new("grid", grid_rules());

        let output = run(
            &codemod,
            "Grid.tsx",
            "const view = <Grid />;\napi.setDomLayout(value);",
        )
        .expect("apply");

        assert!(output.source.is_some());
    }

    #[test]
    fn broken_sources_are_rejected() {
        let codemod = RuleCodemod::new("grid", grid_rules());
        let err = run(&codemod, "grid.ts", "gridApi.setDomLayout(;").expect_err("broken");
        assert!(matches!(err, CodemodError::Unparsable { .. }));
    }
}
