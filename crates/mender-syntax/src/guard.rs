//! Semantic guards that veto matches on unrelated receivers.
//!
//! A pattern such as `$API.showLoadingOverlay()` matches any object with that
//! method. Before a rule acts, the rewriter asks a [`SemanticGuard`] whether
//! the captured subject is really a reference to the migrated API.

use std::collections::BTreeSet;

use crate::matcher::Bindings;
use crate::tree::{NodeId, NodeRef, SyntaxTree};

/// Information about the rule a guard is asked to approve.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    /// Identifier of the rule that matched.
    pub rule_id: &'a str,
    /// Name of the subject metavariable.
    pub subject: &'a str,
    /// Every binding produced by the match.
    pub bindings: &'a Bindings,
}

/// Decides whether a captured subject refers to the migrated API.
pub trait SemanticGuard: Send + Sync {
    /// Returns `true` if the node at `node` is an API reference.
    fn is_api_reference(&self, tree: &SyntaxTree, node: NodeId, context: &GuardContext<'_>)
    -> bool;
}

impl<F> SemanticGuard for F
where
    F: Fn(&SyntaxTree, NodeId, &GuardContext<'_>) -> bool + Send + Sync,
{
    fn is_api_reference(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        context: &GuardContext<'_>,
    ) -> bool {
        self(tree, node, context)
    }
}

/// Accepts every subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SemanticGuard for AcceptAll {
    fn is_api_reference(&self, _: &SyntaxTree, _: NodeId, _: &GuardContext<'_>) -> bool {
        true
    }
}

/// Accepts subjects whose trailing identifier is one of a set of names.
///
/// `gridApi`, `this.gridApi` and `params.api` are all recognised when the list
/// contains `gridApi` and `api`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameListGuard {
    names: BTreeSet<String>,
}

impl NameListGuard {
    /// Creates a guard accepting the given receiver names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the accepted names.
    #[must_use]
    pub const fn names(&self) -> &BTreeSet<String> {
        &self.names
    }
}

impl SemanticGuard for NameListGuard {
    fn is_api_reference(&self, tree: &SyntaxTree, node: NodeId, _: &GuardContext<'_>) -> bool {
        tree.node(node)
            .and_then(trailing_identifier)
            .is_some_and(|name| self.names.contains(name))
    }
}

/// Finds the right-most identifier-like leaf of a receiver expression.
fn trailing_identifier(node: NodeRef<'_>) -> Option<&str> {
    let language = node.tree().language();
    let mut current = node;
    loop {
        if let Some(text) = current.leaf_text() {
            let is_identifier = current
                .kind()
                .grammar_name()
                .is_some_and(|kind| language.is_identifier_kind(kind));
            return is_identifier.then_some(text);
        }
        current = current.named_children().last()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SupportedLanguage;
    use crate::parser::Parser;
    use rstest::rstest;

    fn expression(source: &str) -> (SyntaxTree, NodeId) {
        let tree = Parser::new(SupportedLanguage::TypeScript)
            .expect("parser")
            .parse(&format!("{source};"))
            .expect("parse");
        let id = tree
            .post_order()
            .into_iter()
            .rev()
            .find(|id| {
                tree.node(*id).is_some_and(|n| {
                    n.text() == source && n.kind().grammar_name() != Some("expression_statement")
                })
            })
            .expect("expression present");
        (tree, id)
    }

    fn check(guard: &dyn SemanticGuard, source: &str) -> bool {
        let (tree, id) = expression(source);
        let bindings = Bindings::default();
        let context = GuardContext {
            rule_id: "rule",
            subject: "API",
            bindings: &bindings,
        };
        guard.is_api_reference(&tree, id, &context)
    }

    #[rstest]
    #[case("gridApi", true)]
    #[case("this.gridApi", true)]
    #[case("params.api", true)]
    #[case("myUnrelatedObject", false)]
    #[case("getApi()", false)]
    fn name_list_guard_checks_trailing_identifier(#[case] source: &str, #[case] expected: bool) {
        let guard = NameListGuard::new(["gridApi", "api"]);
        assert_eq!(check(&guard, source), expected);
    }

    #[test]
    fn closures_are_guards() {
        let guard = |tree: &SyntaxTree, node: NodeId, _: &GuardContext<'_>| {
            tree.text_of(node).starts_with("grid")
        };
        assert!(check(&guard, "gridOptions"));
        assert!(!check(&guard, "other"));
    }

    #[test]
    fn accept_all_accepts_anything() {
        assert!(check(&AcceptAll, "whatever.you.like"));
    }
}
