//! Language detection, Tree-sitter grammar selection, and node-kind tables.
//!
//! The [`SupportedLanguage`] enum identifies a grammar and answers the small
//! set of classification questions the matcher needs when it checks whether a
//! candidate node may bind to a typed placeholder.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Languages supported for structural migration.
///
/// Each variant maps to a Tree-sitter grammar that can parse source code
/// for that language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupportedLanguage {
    /// TypeScript and JavaScript source files, parsed with the TSX grammar.
    #[default]
    TypeScript,
    /// Rust source files (`.rs`).
    Rust,
    /// Python source files (`.py`).
    Python,
}

const TYPESCRIPT_EXPRESSIONS: &[&str] = &[
    "identifier",
    "this",
    "super",
    "number",
    "string",
    "template_string",
    "regex",
    "true",
    "false",
    "null",
    "undefined",
    "call_expression",
    "member_expression",
    "subscript_expression",
    "new_expression",
    "arrow_function",
    "function_expression",
    "class",
    "object",
    "array",
    "parenthesized_expression",
    "binary_expression",
    "unary_expression",
    "update_expression",
    "assignment_expression",
    "augmented_assignment_expression",
    "ternary_expression",
    "await_expression",
    "yield_expression",
    "as_expression",
    "satisfies_expression",
    "non_null_expression",
    "type_assertion",
    "sequence_expression",
    "instantiation_expression",
    "jsx_element",
    "jsx_self_closing_element",
];

const RUST_EXPRESSIONS: &[&str] = &[
    "identifier",
    "self",
    "scoped_identifier",
    "integer_literal",
    "float_literal",
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "boolean_literal",
    "call_expression",
    "field_expression",
    "macro_invocation",
    "binary_expression",
    "unary_expression",
    "reference_expression",
    "index_expression",
    "tuple_expression",
    "array_expression",
    "closure_expression",
    "if_expression",
    "match_expression",
    "block",
    "parenthesized_expression",
    "struct_expression",
    "try_expression",
    "await_expression",
    "range_expression",
    "type_cast_expression",
    "return_expression",
    "assignment_expression",
    "compound_assignment_expr",
    "unit_expression",
    "loop_expression",
    "while_expression",
    "for_expression",
];

const PYTHON_EXPRESSIONS: &[&str] = &[
    "identifier",
    "integer",
    "float",
    "string",
    "concatenated_string",
    "true",
    "false",
    "none",
    "call",
    "attribute",
    "subscript",
    "binary_operator",
    "boolean_operator",
    "comparison_operator",
    "not_operator",
    "unary_operator",
    "lambda",
    "conditional_expression",
    "list",
    "dictionary",
    "set",
    "tuple",
    "parenthesized_expression",
    "list_comprehension",
    "dictionary_comprehension",
    "set_comprehension",
    "generator_expression",
    "await",
    "named_expression",
];

const IDENTIFIERS: &[&str] = &[
    "identifier",
    "property_identifier",
    "private_property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "field_identifier",
    "type_identifier",
];

const LITERALS: &[&str] = &[
    "string",
    "template_string",
    "number",
    "true",
    "false",
    "null",
    "undefined",
    "regex",
    "integer_literal",
    "float_literal",
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "boolean_literal",
    "integer",
    "float",
    "none",
];

const STATEMENT_SUFFIXES: &[&str] = &["_statement", "_declaration", "_definition", "_item"];

impl SupportedLanguage {
    /// Detects the language from a file extension.
    ///
    /// Returns `None` if the extension is not recognised.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let normalised = ext.to_ascii_lowercase();
        match normalised.as_str() {
            "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs" => Some(Self::TypeScript),
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            _ => None,
        }
    }

    /// Detects the language from a file path by examining its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the Tree-sitter language grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            // The TSX grammar accepts plain TypeScript, JSX, and JavaScript.
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Returns the grammar for a file at `path`.
    ///
    /// The TSX grammar rejects `<T>expr` casts and generic arrow functions,
    /// so `.ts`, `.mts` and `.cts` files use the plain TypeScript grammar.
    /// Every other path gets [`Self::tree_sitter_language`].
    #[must_use]
    pub fn grammar_for_path(self, path: &Path) -> tree_sitter::Language {
        let plain_typescript = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ["ts", "mts", "cts"]
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            });
        match self {
            Self::TypeScript if plain_typescript => {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }
            _ => self.tree_sitter_language(),
        }
    }

    /// Returns the lower-case identifier for this language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Rust => "rust",
            Self::Python => "python",
        }
    }

    /// Returns all supported languages.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::TypeScript, Self::Rust, Self::Python]
    }

    /// Returns the kind of the grammar's root node.
    #[must_use]
    pub const fn root_kind(self) -> &'static str {
        match self {
            Self::TypeScript => "program",
            Self::Rust => "source_file",
            Self::Python => "module",
        }
    }

    /// Returns whether `kind` names an expression in this grammar.
    #[must_use]
    pub fn is_expression_kind(self, kind: &str) -> bool {
        let table = match self {
            Self::TypeScript => TYPESCRIPT_EXPRESSIONS,
            Self::Rust => RUST_EXPRESSIONS,
            Self::Python => PYTHON_EXPRESSIONS,
        };
        table.contains(&kind)
    }

    /// Returns whether `kind` names an identifier-like leaf.
    #[must_use]
    pub fn is_identifier_kind(self, kind: &str) -> bool {
        IDENTIFIERS.contains(&kind)
    }

    /// Returns whether `kind` names a literal value.
    #[must_use]
    pub fn is_literal_kind(self, kind: &str) -> bool {
        LITERALS.contains(&kind)
    }

    /// Returns whether `kind` names a statement or declaration.
    #[must_use]
    pub fn is_statement_kind(self, kind: &str) -> bool {
        STATEMENT_SUFFIXES
            .iter()
            .any(|suffix| kind.ends_with(suffix))
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing a language identifier fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for SupportedLanguage {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "typescript" | "ts" | "tsx" | "javascript" | "js" => Ok(Self::TypeScript),
            "rust" | "rs" => Ok(Self::Rust),
            "python" | "py" => Ok(Self::Python),
            other => Err(LanguageParseError(other.to_owned())),
        }
    }
}
