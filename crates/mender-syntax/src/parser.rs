//! Tree-sitter parsing into arena-backed syntax trees.
//!
//! The [`Parser`] wraps a Tree-sitter parser for one language and converts
//! each parse into a [`SyntaxTree`]. Tree-sitter is error-tolerant, so a tree
//! is produced even for malformed input; the syntax errors it recovered from
//! are kept on the tree and can be inspected with [`SyntaxTree::errors`].

use std::ops::Range;
use std::path::Path;

use tracing::debug;

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::position::{Position, point_to_one_based};
use crate::tree::{SyntaxTree, TreeBuilder};

const PARSER_TARGET: &str = "mender_syntax::parser";

/// Information about a syntax error found during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// Position (one-based) where the error starts.
    pub position: Position,
    /// A snippet of the problematic source text.
    pub context: String,
    /// Human-readable description of the error.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn from_node(node: tree_sitter::Node<'_>, source: &str) -> Self {
        let byte_range = node.byte_range();

        // Long error regions are truncated to keep diagnostics readable.
        let context = source
            .get(byte_range.clone())
            .map(|s| {
                if s.chars().count() > 50 {
                    let truncated: String = s.chars().take(47).collect();
                    format!("{truncated}...")
                } else {
                    s.to_owned()
                }
            })
            .unwrap_or_default();

        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };

        Self {
            byte_range,
            position: point_to_one_based(node.start_position()),
            context,
            message,
        }
    }
}

/// Tree-sitter parser wrapper for a specific language.
///
/// Each parser instance is configured for a single language. Create multiple
/// parsers if you need to parse multiple languages.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SupportedLanguage,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Creates a new parser for the given language.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser cannot be initialised
    /// with the language grammar.
    pub fn new(language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|e| SyntaxError::parser_init(language, e.to_string()))?;

        Ok(Self { inner, language })
    }

    /// Creates a parser for a file at `path`, picking the grammar variant
    /// its extension calls for.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser cannot be initialised
    /// with the grammar.
    pub fn for_path(language: SupportedLanguage, path: &Path) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.grammar_for_path(path))
            .map_err(|e| SyntaxError::parser_init(language, e.to_string()))?;

        Ok(Self { inner, language })
    }

    /// Returns the language this parser is configured for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Parses source code into a [`SyntaxTree`].
    ///
    /// # Errors
    ///
    /// Returns an error if the parser fails to produce a syntax tree. This
    /// is rare and typically indicates a parser configuration issue.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxTree, SyntaxError> {
        let raw = self.parse_raw(source)?;
        let errors = collect_errors(&raw, source);
        if !errors.is_empty() {
            debug!(
                target: PARSER_TARGET,
                language = %self.language,
                errors = errors.len(),
                "parsed source with syntax errors"
            );
        }
        Ok(TreeBuilder::new(source, self.language).build(&raw, errors))
    }

    pub(crate) fn parse_raw(&mut self, source: &str) -> Result<tree_sitter::Tree, SyntaxError> {
        self.inner
            .parse(source, None)
            .ok_or_else(|| SyntaxError::parse(self.language, "parsing failed"))
    }
}

/// Collects every ERROR and MISSING node of a raw parse.
pub(crate) fn collect_errors(tree: &tree_sitter::Tree, source: &str) -> Vec<SyntaxErrorInfo> {
    let mut errors = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            errors.push(SyntaxErrorInfo::from_node(node, source));
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    errors
}
