//! Conversion from Tree-sitter trees into the arena representation.

use crate::language::SupportedLanguage;
use crate::metavariables::metavar_name_from_placeholder;
use crate::parser::SyntaxErrorInfo;
use crate::position::{Position, Span};
use crate::tree::{NodeData, NodeId, NodeKind, Piece, Placeholder, SyntaxTree};

/// Builds a [`SyntaxTree`] from a Tree-sitter parse.
///
/// When a placeholder resolver is installed, leaves whose text is a
/// metavariable sentinel become [`NodeKind::Placeholder`] nodes.
pub(crate) struct TreeBuilder<'s> {
    source: &'s str,
    language: SupportedLanguage,
    keep_spans: bool,
    resolve: Option<&'s dyn Fn(&str) -> Option<Placeholder>>,
}

impl<'s> TreeBuilder<'s> {
    pub(crate) const fn new(source: &'s str, language: SupportedLanguage) -> Self {
        Self {
            source,
            language,
            keep_spans: true,
            resolve: None,
        }
    }

    /// Converts sentinel leaves using `resolve` and drops source spans.
    ///
    /// Pattern and template text is never the text being migrated, so their
    /// positions would only mislead diagnostics.
    pub(crate) const fn with_placeholders(
        mut self,
        resolve: &'s dyn Fn(&str) -> Option<Placeholder>,
    ) -> Self {
        self.resolve = Some(resolve);
        self.keep_spans = false;
        self
    }

    pub(crate) fn build(
        self,
        tree: &tree_sitter::Tree,
        errors: Vec<SyntaxErrorInfo>,
    ) -> SyntaxTree {
        let mut out = SyntaxTree::empty(self.language);
        let root = tree.root_node();
        let root_id = self.convert(&mut out, root, None, 0..self.source.len());
        out.set_root(root_id);
        out.errors = errors;
        out
    }

    fn convert(
        &self,
        out: &mut SyntaxTree,
        node: tree_sitter::Node<'_>,
        parent: Option<NodeId>,
        range: std::ops::Range<usize>,
    ) -> NodeId {
        let span = self.keep_spans.then(|| {
            let mut span = Span::from_node(node);
            if parent.is_none() {
                // The root owns leading and trailing whitespace too.
                span.byte_range = range.clone();
                span.start = Position::new(1, 1);
            }
            span
        });

        if node.child_count() == 0 {
            let text = self.slice(range.start, range.end);
            let kind = self.leaf_kind(node, text);
            return out.push(NodeData {
                kind,
                parent,
                pieces: vec![Piece::Text(text.to_owned())],
                span,
                retired: false,
            });
        }

        let kind = if node.is_named() {
            NodeKind::Syntax(node.kind())
        } else {
            NodeKind::Token(node.kind())
        };
        let id = out.push(NodeData {
            kind,
            parent,
            pieces: Vec::new(),
            span,
            retired: false,
        });

        let mut pieces = Vec::new();
        let mut pending = String::new();
        let mut cursor_byte = range.start;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let child_range = child.byte_range();
            pending.push_str(self.slice(cursor_byte, child_range.start));
            cursor_byte = cursor_byte.max(child_range.end);

            if child.is_extra() {
                // Comments are trivia: they never take part in matching.
                pending.push_str(self.slice(child_range.start, child_range.end));
                continue;
            }

            if !pending.is_empty() {
                pieces.push(Piece::Trivia(std::mem::take(&mut pending)));
            }
            let child_id = self.convert(out, child, Some(id), child_range);
            pieces.push(Piece::Child(child_id));
        }
        pending.push_str(self.slice(cursor_byte, range.end));
        if !pending.is_empty() {
            pieces.push(Piece::Trivia(pending));
        }

        out.set_pieces(id, pieces);
        id
    }

    fn leaf_kind(&self, node: tree_sitter::Node<'_>, text: &str) -> NodeKind {
        let placeholder = self.resolve.and_then(|resolve| {
            metavar_name_from_placeholder(text).and_then(|_| resolve(text))
        });
        match placeholder {
            Some(placeholder) => NodeKind::Placeholder(placeholder),
            None if node.is_named() => NodeKind::Syntax(node.kind()),
            None => NodeKind::Token(node.kind()),
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'s str {
        if start >= end {
            return "";
        }
        self.source.get(start..end).unwrap_or_default()
    }
}
