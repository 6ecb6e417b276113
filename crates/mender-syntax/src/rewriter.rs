//! Rule-based rewriting of whole syntax trees.
//!
//! The [`RuleRewriter`] visits every node of a tree once, children before
//! parents. For each node it tries the replacements of its [`RuleSet`] in
//! order and grafts the first guarded match. When no replacement applies it
//! checks the deprecations, which only produce findings. Nodes grafted during
//! the pass are not visited again.

use tracing::{debug, trace};

use crate::error::SyntaxError;
use crate::guard::{AcceptAll, GuardContext, SemanticGuard};
use crate::language::SupportedLanguage;
use crate::matcher::{Binding, Bindings};
use crate::position::Span;
use crate::replacement::{Deprecation, Execution, Replacement};
use crate::tree::{NodeId, SyntaxTree};

const REWRITER_TARGET: &str = "mender_syntax::rewriter";

/// An ordered collection of replacements and deprecations for one language.
#[derive(Debug)]
pub struct RuleSet {
    language: SupportedLanguage,
    replacements: Vec<Replacement>,
    deprecations: Vec<Deprecation>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub const fn new(language: SupportedLanguage) -> Self {
        Self {
            language,
            replacements: Vec::new(),
            deprecations: Vec::new(),
        }
    }

    /// Appends a replacement. Earlier replacements take priority.
    #[must_use]
    pub fn replacement(mut self, replacement: Replacement) -> Self {
        self.replacements.push(replacement);
        self
    }

    /// Appends a deprecation.
    #[must_use]
    pub fn deprecation(mut self, deprecation: Deprecation) -> Self {
        self.deprecations.push(deprecation);
        self
    }

    /// Returns the language the rules apply to.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the replacements in priority order.
    #[must_use]
    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Returns the deprecations in priority order.
    #[must_use]
    pub fn deprecations(&self) -> &[Deprecation] {
        &self.deprecations
    }
}

/// Switches that alter how matches are acted upon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Apply replacements marked as dangerous instead of withholding them.
    pub apply_dangerous_edits: bool,
}

/// What the rewriter decided for one node.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// A replacement matched and should be grafted.
    Matched {
        /// Identifier of the replacement.
        rule_id: String,
        /// The rendered execution.
        execution: Execution,
        /// Warning to record when the replacement is applied.
        warning: Option<String>,
    },
    /// A dangerous replacement matched but dangerous edits are disabled.
    Withheld {
        /// Identifier of the replacement.
        rule_id: String,
    },
    /// A deprecation matched; the node must be migrated by hand.
    Deprecated {
        /// Identifier of the deprecation.
        rule_id: String,
        /// The deprecation message.
        message: String,
    },
    /// No rule applies to the node.
    NoMatch,
}

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The code needs manual attention.
    Error,
    /// The code was changed but should be reviewed.
    Warning,
}

/// A located message produced while rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// How serious the finding is.
    pub severity: Severity,
    /// Identifier of the rule that produced it.
    pub rule_id: String,
    /// Human-readable message.
    pub message: String,
    /// Where in the parsed source the finding applies, if known.
    pub span: Option<Span>,
}

/// Summary of one rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Number of replacements grafted.
    pub applied: usize,
    /// Findings in traversal order.
    pub findings: Vec<Finding>,
}

impl RewriteReport {
    /// Returns whether any replacement was grafted.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.applied > 0
    }

    /// Iterates over error findings.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
    }

    /// Iterates over warning findings.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
    }
}

/// Applies a [`RuleSet`] across a tree, consulting a semantic guard.
#[derive(Debug)]
pub struct RuleRewriter<G = AcceptAll> {
    rules: RuleSet,
    guard: G,
}

impl RuleRewriter<AcceptAll> {
    /// Creates a rewriter that accepts every subject.
    #[must_use]
    pub const fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            guard: AcceptAll,
        }
    }
}

impl<G: SemanticGuard> RuleRewriter<G> {
    /// Creates a rewriter consulting `guard` before any rule acts.
    #[must_use]
    pub const fn with_guard(rules: RuleSet, guard: G) -> Self {
        Self { rules, guard }
    }

    /// Returns the rules.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Decides what to do with the node at `node` without editing the tree.
    ///
    /// # Errors
    ///
    /// Returns an error only if a matched template fails to render.
    pub fn evaluate(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        options: RewriteOptions,
    ) -> Result<MatchOutcome, SyntaxError> {
        for replacement in &self.rules.replacements {
            let Some(result) = replacement.exec(tree, node) else {
                continue;
            };
            let execution = result?;
            if !self.approves(tree, replacement.id(), replacement.subject(), &execution.refs) {
                trace!(
                    target: REWRITER_TARGET,
                    rule = replacement.id(),
                    %node,
                    "guard rejected replacement subject"
                );
                continue;
            }
            if replacement.is_dangerous() && !options.apply_dangerous_edits {
                return Ok(MatchOutcome::Withheld {
                    rule_id: replacement.id().to_owned(),
                });
            }
            return Ok(MatchOutcome::Matched {
                rule_id: replacement.id().to_owned(),
                execution,
                warning: replacement.warning().map(str::to_owned),
            });
        }

        for deprecation in &self.rules.deprecations {
            let Some(refs) = deprecation.match_at(tree, node) else {
                continue;
            };
            if self.approves(tree, deprecation.id(), deprecation.subject(), &refs) {
                return Ok(MatchOutcome::Deprecated {
                    rule_id: deprecation.id().to_owned(),
                    message: deprecation.message().to_owned(),
                });
            }
        }

        Ok(MatchOutcome::NoMatch)
    }

    /// Rewrites `tree` in place in a single post-order pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree and rules target different languages or
    /// a rendered replacement cannot be grafted.
    pub fn rewrite(
        &self,
        tree: &mut SyntaxTree,
        options: RewriteOptions,
    ) -> Result<RewriteReport, SyntaxError> {
        if tree.language() != self.rules.language {
            return Err(SyntaxError::invalid_edit(format!(
                "{} rules cannot rewrite a {} tree",
                self.rules.language,
                tree.language()
            )));
        }

        let mut report = RewriteReport::default();
        for node in tree.post_order() {
            if !tree.is_live(node) {
                continue;
            }
            let span = tree.node(node).and_then(|n| n.span().cloned());
            match self.evaluate(tree, node, options)? {
                MatchOutcome::Matched {
                    rule_id,
                    execution,
                    warning,
                } => {
                    tree.replace_at(execution.node, &execution.replacement)?;
                    report.applied += 1;
                    debug!(
                        target: REWRITER_TARGET,
                        rule = %rule_id,
                        %node,
                        "applied replacement"
                    );
                    if let Some(message) = warning {
                        report.findings.push(Finding {
                            severity: Severity::Warning,
                            rule_id,
                            message,
                            span,
                        });
                    }
                }
                MatchOutcome::Withheld { rule_id } => {
                    debug!(
                        target: REWRITER_TARGET,
                        rule = %rule_id,
                        %node,
                        "withheld dangerous replacement"
                    );
                    report.findings.push(Finding {
                        severity: Severity::Warning,
                        message: format!(
                            "rule '{rule_id}' is a dangerous edit and was not applied; \
                             enable dangerous edits to apply it"
                        ),
                        rule_id,
                        span,
                    });
                }
                MatchOutcome::Deprecated { rule_id, message } => {
                    debug!(
                        target: REWRITER_TARGET,
                        rule = %rule_id,
                        %node,
                        "found usage that must be migrated manually"
                    );
                    report.findings.push(Finding {
                        severity: Severity::Error,
                        rule_id,
                        message,
                        span,
                    });
                }
                MatchOutcome::NoMatch => {}
            }
        }
        Ok(report)
    }

    fn approves(
        &self,
        tree: &SyntaxTree,
        rule_id: &str,
        subject: Option<&str>,
        bindings: &Bindings,
    ) -> bool {
        let Some(subject) = subject else {
            return true;
        };
        let context = GuardContext {
            rule_id,
            subject,
            bindings,
        };
        match bindings.get(subject) {
            Some(Binding::Single(id)) => self.guard.is_api_reference(tree, *id, &context),
            Some(Binding::Multiple(ids)) => {
                !ids.is_empty()
                    && ids
                        .iter()
                        .all(|id| self.guard.is_api_reference(tree, *id, &context))
            }
            None => false,
        }
    }
}
