//! Structural matching of compiled patterns against tree locations.
//!
//! A [`TreeMatcher`] answers one question: does the node at this location
//! have the pattern's shape, and if so what did each metavariable capture?
//! Matching never mutates the tree and never fails with an error; a node that
//! does not match simply yields `None`.

mod bindings;
mod matching;

use std::collections::BTreeSet;

use crate::pattern::Pattern;
use crate::tree::{NodeId, SyntaxTree};

pub use bindings::{Binding, Bindings};

/// Something that can test a tree location against a shape.
pub trait TreeMatcher: Send + Sync {
    /// Matches the node at `node`, returning its bindings on success.
    fn match_at(&self, tree: &SyntaxTree, node: NodeId) -> Option<Bindings>;

    /// Returns the names bound by every successful match.
    fn capture_names(&self) -> BTreeSet<String>;
}

impl TreeMatcher for Pattern {
    fn match_at(&self, tree: &SyntaxTree, node: NodeId) -> Option<Bindings> {
        if tree.language() != self.language() {
            return None;
        }
        let source = tree.node(node)?;
        let pattern = self.root()?;
        let mut bindings = Bindings::default();
        matching::nodes_match(source, pattern, &mut bindings).then_some(bindings)
    }

    fn capture_names(&self) -> BTreeSet<String> {
        Self::capture_names(self)
    }
}

/// A successful match found by [`Pattern::find_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Location of the matched node.
    pub node: NodeId,
    /// What each metavariable captured.
    pub bindings: Bindings,
}

impl Pattern {
    /// Finds every match in `tree`, children before parents.
    #[must_use]
    pub fn find_all(&self, tree: &SyntaxTree) -> Vec<Match> {
        tree.post_order()
            .into_iter()
            .filter_map(|node| {
                self.match_at(tree, node)
                    .map(|bindings| Match { node, bindings })
            })
            .collect()
    }

    /// Finds the first match in `tree`, children before parents.
    #[must_use]
    pub fn find_first(&self, tree: &SyntaxTree) -> Option<Match> {
        tree.post_order().into_iter().find_map(|node| {
            self.match_at(tree, node)
                .map(|bindings| Match { node, bindings })
        })
    }
}

/// Tries alternative matchers in order and keeps the first success.
pub struct AnyOf {
    alternatives: Vec<Box<dyn TreeMatcher>>,
}

impl AnyOf {
    /// Creates a matcher over `alternatives`, tried in the given order.
    #[must_use]
    pub fn new(alternatives: Vec<Box<dyn TreeMatcher>>) -> Self {
        Self { alternatives }
    }

    /// Appends another alternative.
    #[must_use]
    pub fn or(mut self, matcher: impl TreeMatcher + 'static) -> Self {
        self.alternatives.push(Box::new(matcher));
        self
    }
}

impl std::fmt::Debug for AnyOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyOf")
            .field("alternatives", &self.alternatives.len())
            .finish()
    }
}

impl TreeMatcher for AnyOf {
    fn match_at(&self, tree: &SyntaxTree, node: NodeId) -> Option<Bindings> {
        self.alternatives
            .iter()
            .find_map(|matcher| matcher.match_at(tree, node))
    }

    /// Only names every alternative binds are guaranteed to be present.
    fn capture_names(&self) -> BTreeSet<String> {
        let mut alternatives = self.alternatives.iter();
        let Some(first) = alternatives.next() else {
            return BTreeSet::new();
        };
        alternatives.fold(first.capture_names(), |common, matcher| {
            common
                .intersection(&matcher.capture_names())
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests;
