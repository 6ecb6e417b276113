//! Structural comparison of pattern trees against candidate nodes.

use crate::matcher::bindings::{Binding, Bindings};
use crate::metavariables::MetaVarKind;
use crate::tree::{NodeKind, NodeRef, Placeholder, SyntaxTree};

/// Returns the placeholder a pattern node stands for.
///
/// A bare expression statement wrapping only a placeholder stands for that
/// placeholder, so `$$$BODY` inside a block captures whole statements.
fn placeholder_of<'p>(pattern: NodeRef<'p>) -> Option<&'p Placeholder> {
    if let Some(placeholder) = pattern.kind().as_placeholder() {
        return Some(placeholder);
    }
    if pattern.kind().grammar_name() != Some("expression_statement") {
        return None;
    }
    let mut named = pattern.named_children();
    match (named.next(), named.next()) {
        (Some(only), None) => only.kind().as_placeholder(),
        _ => None,
    }
}

fn is_sequence_placeholder(pattern: NodeRef<'_>) -> bool {
    placeholder_of(pattern).is_some_and(|p| p.kind == MetaVarKind::Multiple)
}

/// Checks whether `source` matches `pattern`, recording captures.
///
/// `bindings` may hold partial captures when this returns `false`; callers
/// discard them.
pub(super) fn nodes_match(
    source: NodeRef<'_>,
    pattern: NodeRef<'_>,
    bindings: &mut Bindings,
) -> bool {
    if let Some(placeholder) = placeholder_of(pattern) {
        return bind_single(source, placeholder, bindings);
    }

    match (pattern.kind(), source.kind()) {
        (NodeKind::Syntax(expected), NodeKind::Syntax(actual))
        | (NodeKind::Token(expected), NodeKind::Token(actual)) => {
            if expected != actual {
                return false;
            }
        }
        (NodeKind::Sequence, NodeKind::Sequence) => {}
        (NodeKind::Syntax(_) | NodeKind::Token(_) | NodeKind::Sequence, _)
        | (NodeKind::Placeholder(_), _) => return false,
    }

    match (pattern.leaf_text(), source.leaf_text()) {
        (Some(expected), Some(actual)) => expected == actual,
        (None, None) => match_children(source, pattern, bindings),
        _ => false,
    }
}

fn bind_single(source: NodeRef<'_>, placeholder: &Placeholder, bindings: &mut Bindings) -> bool {
    let tree = source.tree();
    match placeholder.kind {
        MetaVarKind::Single => {
            placeholder.class.admits(tree.language(), source.kind())
                && bindings.insert_consistent(
                    tree,
                    &placeholder.name,
                    Binding::Single(source.id()),
                )
        }
        MetaVarKind::Multiple => bindings.insert_consistent(
            tree,
            &placeholder.name,
            Binding::Multiple(vec![source.id()]),
        ),
    }
}

fn match_children(source: NodeRef<'_>, pattern: NodeRef<'_>, bindings: &mut Bindings) -> bool {
    let source_children: Vec<_> = source.children().collect();
    let pattern_children: Vec<_> = pattern.children().collect();

    if pattern_children.iter().any(|child| is_sequence_placeholder(*child)) {
        return SequenceMatcher {
            tree: source.tree(),
            source_children: &source_children,
            pattern_children: &pattern_children,
        }
        .matches(0, 0, bindings);
    }

    source_children.len() == pattern_children.len()
        && source_children
            .iter()
            .zip(&pattern_children)
            .all(|(s, p)| nodes_match(*s, *p, bindings))
}

/// Backtracking matcher for child lists containing `$$$` placeholders.
struct SequenceMatcher<'s, 'p, 'c> {
    tree: &'s SyntaxTree,
    source_children: &'c [NodeRef<'s>],
    pattern_children: &'c [NodeRef<'p>],
}

impl SequenceMatcher<'_, '_, '_> {
    fn matches(&self, source_idx: usize, pattern_idx: usize, bindings: &mut Bindings) -> bool {
        let Some(pattern_child) = self.pattern_children.get(pattern_idx).copied() else {
            return source_idx == self.source_children.len();
        };

        match placeholder_of(pattern_child).filter(|p| p.kind == MetaVarKind::Multiple) {
            Some(placeholder) => {
                self.matches_multiple(source_idx, pattern_idx, placeholder, bindings)
            }
            None => self.matches_single(source_idx, pattern_idx, pattern_child, bindings),
        }
    }

    /// Tries every run length for the sequence placeholder, shortest first.
    fn matches_multiple(
        &self,
        source_idx: usize,
        pattern_idx: usize,
        placeholder: &Placeholder,
        bindings: &mut Bindings,
    ) -> bool {
        for end in source_idx..=self.source_children.len() {
            let Some(run) = self.source_children.get(source_idx..end) else {
                continue;
            };

            let mut trial = bindings.clone();
            let ids = run.iter().map(NodeRef::id).collect();
            if !trial.insert_consistent(self.tree, &placeholder.name, Binding::Multiple(ids)) {
                continue;
            }
            if self.matches(end, pattern_idx + 1, &mut trial) {
                *bindings = trial;
                return true;
            }
        }
        false
    }

    fn matches_single(
        &self,
        source_idx: usize,
        pattern_idx: usize,
        pattern_child: NodeRef<'_>,
        bindings: &mut Bindings,
    ) -> bool {
        let Some(source_child) = self.source_children.get(source_idx).copied() else {
            return false;
        };

        let mut trial = bindings.clone();
        if nodes_match(source_child, pattern_child, &mut trial)
            && self.matches(source_idx + 1, pattern_idx + 1, &mut trial)
        {
            *bindings = trial;
            return true;
        }
        false
    }
}
