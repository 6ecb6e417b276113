//! Node classes that restrict what a placeholder may bind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::language::SupportedLanguage;
use crate::tree::NodeKind;

/// The class of syntax node a placeholder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeClass {
    /// Any node at all.
    #[default]
    Any,
    /// An expression.
    Expression,
    /// An identifier-like leaf.
    Identifier,
    /// A statement or declaration.
    Statement,
    /// A literal value.
    Literal,
}

impl NodeClass {
    /// Returns whether a node of `kind` belongs to this class.
    ///
    /// Placeholders and sequences never satisfy a concrete class.
    #[must_use]
    pub fn admits(self, language: SupportedLanguage, kind: &NodeKind) -> bool {
        let grammar = match kind {
            NodeKind::Syntax(name) => *name,
            NodeKind::Token(name) => {
                // Keyword literals such as `true` parse as anonymous tokens in
                // some grammars.
                return matches!(self, Self::Any)
                    || (matches!(self, Self::Literal | Self::Expression)
                        && language.is_literal_kind(name));
            }
            NodeKind::Placeholder(_) | NodeKind::Sequence => return matches!(self, Self::Any),
        };
        match self {
            Self::Any => true,
            Self::Expression => language.is_expression_kind(grammar),
            Self::Identifier => language.is_identifier_kind(grammar),
            Self::Statement => language.is_statement_kind(grammar),
            Self::Literal => language.is_literal_kind(grammar),
        }
    }

    /// Returns the lower-case name of the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Expression => "expression",
            Self::Identifier => "identifier",
            Self::Statement => "statement",
            Self::Literal => "literal",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a node class name is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown node class: '{0}'")]
pub struct NodeClassParseError(String);

impl FromStr for NodeClass {
    type Err = NodeClassParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "any" | "node" => Ok(Self::Any),
            "expression" | "expr" => Ok(Self::Expression),
            "identifier" | "ident" => Ok(Self::Identifier),
            "statement" | "stmt" => Ok(Self::Statement),
            "literal" => Ok(Self::Literal),
            other => Err(NodeClassParseError(other.to_owned())),
        }
    }
}

/// Declares the node class of each named placeholder in a pattern.
///
/// Names that are not declared accept [`NodeClass::Any`].
///
/// ```ignore
/// let captures = CaptureSet::new().expression("API").expression("VALUE");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSet {
    classes: BTreeMap<String, NodeClass>,
}

impl CaptureSet {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with the given class.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, class: NodeClass) -> Self {
        self.classes.insert(name.into(), class);
        self
    }

    /// Declares `name` as an expression placeholder.
    #[must_use]
    pub fn expression(self, name: impl Into<String>) -> Self {
        self.with(name, NodeClass::Expression)
    }

    /// Declares `name` as an identifier placeholder.
    #[must_use]
    pub fn identifier(self, name: impl Into<String>) -> Self {
        self.with(name, NodeClass::Identifier)
    }

    /// Declares `name` as a statement placeholder.
    #[must_use]
    pub fn statement(self, name: impl Into<String>) -> Self {
        self.with(name, NodeClass::Statement)
    }

    /// Declares `name` as a literal placeholder.
    #[must_use]
    pub fn literal(self, name: impl Into<String>) -> Self {
        self.with(name, NodeClass::Literal)
    }

    /// Declares `name` as accepting any node.
    #[must_use]
    pub fn any(self, name: impl Into<String>) -> Self {
        self.with(name, NodeClass::Any)
    }

    /// Returns the class declared for `name`, defaulting to [`NodeClass::Any`].
    #[must_use]
    pub fn class_of(&self, name: &str) -> NodeClass {
        self.classes.get(name).copied().unwrap_or_default()
    }

    /// Iterates over the declared names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}
