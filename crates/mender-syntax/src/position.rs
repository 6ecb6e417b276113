//! Source positions attached to parsed nodes.
//!
//! Tree-sitter positions are zero-based. For user-facing diagnostics we keep
//! one-based line and column numbers.

use std::fmt;
use std::ops::Range;

/// A one-based line and column within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// One-based line number.
    pub line: u32,
    /// One-based column number (byte offset within the line, plus one).
    pub column: u32,
}

impl Position {
    /// Creates a position from one-based coordinates.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The region of the original source text a node was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte range in the parsed source (half-open).
    pub byte_range: Range<usize>,
    /// Position of the first byte.
    pub start: Position,
    /// Position just past the last byte.
    pub end: Position,
}

impl Span {
    pub(crate) fn from_node(node: tree_sitter::Node<'_>) -> Self {
        Self {
            byte_range: node.byte_range(),
            start: point_to_one_based(node.start_position()),
            end: point_to_one_based(node.end_position()),
        }
    }
}

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> Position {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    Position { line, column }
}
