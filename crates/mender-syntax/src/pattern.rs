//! Pattern compilation for structural code matching.
//!
//! Patterns are written as ordinary source code of the target language with
//! metavariables in place of the parts that vary:
//!
//! - `$VAR` matches a single node and captures it as `VAR`
//! - `$_` matches a single node without capturing (wildcard)
//! - `$$$VAR` matches zero or more sibling nodes and captures them as `VAR`
//!
//! Metavariable names must start with an uppercase letter or underscore,
//! followed by uppercase letters, digits, or underscores. The node class a
//! capture may bind is declared with a [`CaptureSet`].

use std::collections::{BTreeMap, BTreeSet};

use crate::capture::{CaptureSet, NodeClass};
use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::metavariables::{
    MetaVarKind, Occurrence, WILDCARD, metavar_name_from_placeholder, normalise_metavariables,
};
use crate::parser::Parser;
use crate::tree::{NodeId, NodeKind, NodeRef, Placeholder, SyntaxTree, TreeBuilder};

/// A compiled structural pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    metavariables: Vec<MetaVariable>,
    tree: SyntaxTree,
}

/// A metavariable declared by a pattern or template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaVariable {
    /// The name of the metavariable (without the `$` prefix).
    pub name: String,
    /// Whether the metavariable binds one node or a run of nodes.
    pub kind: MetaVarKind,
    /// The node class the metavariable may bind.
    pub class: NodeClass,
    /// Byte offset where this metavariable appears in the source text.
    pub offset: usize,
}

impl Pattern {
    /// Compiles a pattern for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern contains invalid metavariable syntax
    /// or cannot be parsed by the language grammar.
    pub fn compile(
        language: SupportedLanguage,
        source: &str,
        captures: &CaptureSet,
    ) -> Result<Self, SyntaxError> {
        let snippet = Snippet::compile(language, source, captures)?;
        Ok(Self {
            source: source.to_owned(),
            metavariables: snippet.metavariables,
            tree: snippet.tree,
        })
    }

    /// Returns the original pattern source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the language this pattern is compiled for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.tree.language()
    }

    /// Returns the metavariables in source order.
    #[must_use]
    pub fn metavariables(&self) -> &[MetaVariable] {
        &self.metavariables
    }

    /// Returns the names this pattern binds on a successful match.
    ///
    /// The wildcard `$_` never binds and is not included.
    #[must_use]
    pub fn capture_names(&self) -> BTreeSet<String> {
        self.metavariables
            .iter()
            .filter(|m| m.name != WILDCARD)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Returns the compiled pattern tree.
    #[must_use]
    pub const fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub(crate) fn root(&self) -> Option<NodeRef<'_>> {
        self.tree.root_node()
    }
}

/// Pattern or template text compiled into a standalone tree.
#[derive(Debug)]
pub(crate) struct Snippet {
    pub(crate) metavariables: Vec<MetaVariable>,
    pub(crate) tree: SyntaxTree,
}

impl Snippet {
    pub(crate) fn compile(
        language: SupportedLanguage,
        source: &str,
        captures: &CaptureSet,
    ) -> Result<Self, SyntaxError> {
        let (normalised, occurrences) = normalise_metavariables(source)?;
        let kinds = kinds_by_name(&occurrences)?;

        let mut parser = Parser::new(language)?;
        let mut text = normalised;
        let mut wrapped = false;
        let mut raw = parser.parse_raw(&text)?;
        if raw.root_node().has_error() {
            text = wrap_pattern_for_parse(language, &text);
            raw = parser.parse_raw(&text)?;
            wrapped = true;
        }
        if raw.root_node().has_error() {
            return Err(SyntaxError::pattern_compile(
                language,
                format!("'{source}' contains syntax errors"),
            ));
        }

        let resolve = |leaf: &str| {
            let name = metavar_name_from_placeholder(leaf)?;
            let kind = kinds.get(name).copied()?;
            Some(Placeholder {
                name: name.to_owned(),
                kind,
                // Sequence captures may span any mix of siblings.
                class: match kind {
                    MetaVarKind::Single => captures.class_of(name),
                    MetaVarKind::Multiple => NodeClass::Any,
                },
            })
        };
        let full = TreeBuilder::new(&text, language)
            .with_placeholders(&resolve)
            .build(&raw, Vec::new());

        let root = select_snippet_root(&full, wrapped).ok_or_else(|| {
            SyntaxError::pattern_compile(language, format!("'{source}' contains no statement"))
        })?;
        let tree = full.extract(root)?.into_tree();

        let bound = count_placeholders(&tree);
        if bound != occurrences.len() {
            return Err(SyntaxError::pattern_compile(
                language,
                format!(
                    "'{source}' must use each metavariable as a whole node of a single statement"
                ),
            ));
        }

        let metavariables = occurrences
            .into_iter()
            .map(|occurrence| {
                let class = match occurrence.kind {
                    MetaVarKind::Single => captures.class_of(&occurrence.name),
                    MetaVarKind::Multiple => NodeClass::Any,
                };
                MetaVariable {
                    name: occurrence.name,
                    kind: occurrence.kind,
                    class,
                    offset: occurrence.offset,
                }
            })
            .collect();

        Ok(Self {
            metavariables,
            tree,
        })
    }
}

fn kinds_by_name(occurrences: &[Occurrence]) -> Result<BTreeMap<&str, MetaVarKind>, SyntaxError> {
    let mut kinds = BTreeMap::new();
    for occurrence in occurrences {
        let previous = kinds.insert(occurrence.name.as_str(), occurrence.kind);
        if previous.is_some_and(|kind| kind != occurrence.kind) {
            return Err(SyntaxError::invalid_metavariable(format!(
                "${} is used both as a single and a sequence metavariable",
                occurrence.name
            )));
        }
    }
    Ok(kinds)
}

/// Picks the first statement of the snippet, unwrapped to its expression when
/// it is a bare expression statement.
fn select_snippet_root(tree: &SyntaxTree, wrapped: bool) -> Option<NodeId> {
    let root = tree.root_node()?;
    let container = if wrapped {
        let wrapper = root.named_children().next()?;
        wrapper.children().find(|child| {
            matches!(
                child.kind().grammar_name(),
                Some("statement_block" | "block")
            )
        })?
    } else {
        root
    };

    let statement = container.named_children().next()?;
    if statement.kind().grammar_name() == Some("expression_statement") {
        let mut named = statement.named_children();
        if let (Some(expression), None) = (named.next(), named.next()) {
            return Some(expression.id());
        }
    }
    Some(statement.id())
}

fn count_placeholders(tree: &SyntaxTree) -> usize {
    tree.post_order()
        .into_iter()
        .filter_map(|id| tree.node(id))
        .filter(|node| matches!(node.kind(), NodeKind::Placeholder(_)))
        .count()
}

fn wrap_pattern_for_parse(language: SupportedLanguage, pattern: &str) -> String {
    match language {
        SupportedLanguage::Rust => {
            let trimmed = pattern.trim_end();
            let needs_semicolon =
                !trimmed.is_empty() && !trimmed.ends_with(';') && !trimmed.ends_with('}');
            let statement = if needs_semicolon {
                format!("{trimmed};")
            } else {
                trimmed.to_owned()
            };

            format!("fn __mender_snippet__() {{ {statement} }}")
        }
        SupportedLanguage::Python => {
            let mut out = String::from("def __mender_snippet__():\n");
            if pattern.trim().is_empty() {
                out.push_str("    pass\n");
                return out;
            }

            for line in pattern.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }

            out
        }
        SupportedLanguage::TypeScript => {
            format!("function __mender_snippet__() {{ {pattern} }}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn compile_unwraps_expression_statement() {
        let pattern = Pattern::compile(
            SupportedLanguage::TypeScript,
            "$API.setDomLayout($VALUE);",
            &CaptureSet::new().expression("API").expression("VALUE"),
        )
        .expect("compile");

        let root = pattern.root().expect("root");
        assert_eq!(root.kind().grammar_name(), Some("call_expression"));
        let names: Vec<_> = pattern.capture_names().into_iter().collect();
        assert_eq!(names, vec!["API", "VALUE"]);
    }

    #[test]
    fn compile_records_declared_classes() {
        let pattern = Pattern::compile(
            SupportedLanguage::TypeScript,
            "$API.refresh($$$ARGS)",
            &CaptureSet::new().identifier("API"),
        )
        .expect("compile");

        let classes: Vec<_> = pattern
            .metavariables()
            .iter()
            .map(|m| (m.name.as_str(), m.kind, m.class))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("API", MetaVarKind::Single, NodeClass::Identifier),
                ("ARGS", MetaVarKind::Multiple, NodeClass::Any),
            ]
        );
    }

    #[rstest]
    #[case(SupportedLanguage::Rust, "$RECV.unwrap()", "call_expression")]
    #[case(SupportedLanguage::Python, "$OBJ.close()", "call")]
    #[case(SupportedLanguage::TypeScript, "let $X = $Y;", "lexical_declaration")]
    fn compile_selects_first_statement(
        #[case] language: SupportedLanguage,
        #[case] source: &str,
        #[case] expected_root: &str,
    ) {
        let pattern = Pattern::compile(language, source, &CaptureSet::new()).expect("compile");
        let root = pattern.root().expect("root");
        assert_eq!(root.kind().grammar_name(), Some(expected_root));
    }

    #[test]
    fn wildcard_is_not_a_capture_name() {
        let pattern = Pattern::compile(
            SupportedLanguage::TypeScript,
            "$_.destroy()",
            &CaptureSet::new(),
        )
        .expect("compile");
        assert!(pattern.capture_names().is_empty());
    }

    #[test]
    fn compile_rejects_mixed_metavariable_kinds() {
        let result = Pattern::compile(
            SupportedLanguage::TypeScript,
            "f($X, $$$X)",
            &CaptureSet::new(),
        );
        assert!(matches!(
            result,
            Err(SyntaxError::InvalidMetavariable { .. })
        ));
    }

    #[test]
    fn compile_rejects_embedded_metavariables() {
        let result = Pattern::compile(
            SupportedLanguage::TypeScript,
            "api.get$NAME()",
            &CaptureSet::new(),
        );
        assert!(matches!(
            result,
            Err(SyntaxError::PatternCompileError { .. })
        ));
    }

    #[test]
    fn compile_rejects_unparsable_pattern() {
        let result = Pattern::compile(SupportedLanguage::TypeScript, "f(((", &CaptureSet::new());
        assert!(result.is_err());
    }
}
