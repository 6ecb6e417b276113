//! Tree-sitter powered structural rewriting for API migrations.
//!
//! This crate is the engine behind `mender`:
//!
//! - **Syntax trees** via [`Parser`] and [`SyntaxTree`], an arena of nodes
//!   addressed by [`NodeId`] that prints back to the exact source text
//! - **Patterns** via [`Pattern`], compiled from source code with `$VAR`,
//!   `$_` and `$$$VAR` metavariables restricted by a [`CaptureSet`]
//! - **Templates** via [`TextTemplate`] and [`FnTemplate`], rendered from the
//!   fragments a match captured
//! - **Rules** via [`Replacement`] and [`Deprecation`], applied across a tree
//!   by the [`RuleRewriter`] under a [`SemanticGuard`]
//!
//! # Supported Languages
//!
//! - TypeScript and JavaScript (`.ts`, `.tsx`, `.js`, `.jsx`, ...)
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//!
//! # Example
//!
//! ```ignore
//! use mender_syntax::{
//!     CaptureSet, Parser, Pattern, Replacement, RewriteOptions, RuleRewriter, RuleSet,
//!     SupportedLanguage, TextTemplate,
//! };
//!
//! let language = SupportedLanguage::TypeScript;
//! let pattern = Pattern::compile(
//!     language,
//!     "$API.setDomLayout($VALUE)",
//!     &CaptureSet::new().expression("API").expression("VALUE"),
//! )?;
//! let template = TextTemplate::compile(language, "$API.setGridOption(\"domLayout\", $VALUE)")?;
//! let rules = RuleSet::new(language)
//!     .replacement(Replacement::new("set-dom-layout", pattern, template)?);
//!
//! let mut tree = Parser::new(language)?.parse("gridApi.setDomLayout(value);")?;
//! RuleRewriter::new(rules).rewrite(&mut tree, RewriteOptions::default())?;
//! assert_eq!(tree.print(), "gridApi.setGridOption(\"domLayout\", value);");
//! # Ok::<(), mender_syntax::SyntaxError>(())
//! ```

mod capture;
mod error;
mod guard;
mod language;
mod matcher;
mod metavariables;
mod parser;
mod pattern;
mod position;
mod replacement;
mod rewriter;
mod template;
mod tree;

pub use capture::{CaptureSet, NodeClass, NodeClassParseError};
pub use error::SyntaxError;
pub use guard::{AcceptAll, GuardContext, NameListGuard, SemanticGuard};
pub use language::{LanguageParseError, SupportedLanguage};
pub use matcher::{AnyOf, Binding, Bindings, Match, TreeMatcher};
pub use metavariables::MetaVarKind;
pub use parser::{Parser, SyntaxErrorInfo};
pub use pattern::{MetaVariable, Pattern};
pub use position::{Position, Span};
pub use replacement::{Deprecation, Execution, Replacement};
pub use rewriter::{
    Finding, MatchOutcome, RewriteOptions, RewriteReport, RuleRewriter, RuleSet, Severity,
};
pub use template::{FnTemplate, RenderInputs, Template, TextTemplate};
pub use tree::{
    Fragment, NodeId, NodeKind, NodeRef, Placeholder, SyntaxTree, structurally_equal,
};

#[cfg(test)]
mod tests;
