//! Replacement templates rendered from captured fragments.
//!
//! A template turns the fragments captured by a successful match into one new
//! fragment. Rendering is deterministic and has no side effects; nothing
//! changes in any document until the rewriter grafts the result.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::capture::CaptureSet;
use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::metavariables::WILDCARD;
use crate::pattern::Snippet;
use crate::tree::{Fragment, NodeData, NodeId, NodeKind, Piece, SyntaxTree};

/// Already-rendered fragments keyed by placeholder name.
#[derive(Debug, Clone, Default)]
pub struct RenderInputs {
    inner: BTreeMap<String, Fragment>,
}

impl RenderInputs {
    /// Creates an empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the fragment for `name`.
    pub fn insert(&mut self, name: impl Into<String>, fragment: Fragment) {
        self.inner.insert(name.into(), fragment);
    }

    /// Returns the fragment for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.inner.get(name)
    }

    /// Returns the fragment for `name` or a missing binding error.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::MissingBinding`] if `name` has no input.
    pub fn require(&self, name: &str) -> Result<&Fragment, SyntaxError> {
        self.get(name)
            .ok_or_else(|| SyntaxError::missing_binding(name))
    }
}

/// Builds a replacement fragment from captured inputs.
pub trait Template: Send + Sync {
    /// Renders the template.
    ///
    /// # Errors
    ///
    /// Returns an error if an input the template needs is missing or cannot
    /// be grafted.
    fn render(&self, inputs: &RenderInputs) -> Result<Fragment, SyntaxError>;

    /// Returns the placeholder names the template reads.
    fn placeholder_names(&self) -> BTreeSet<String>;
}

/// A template written as source text with `$NAME` placeholders.
///
/// ```ignore
/// let template = TextTemplate::compile(
///     SupportedLanguage::TypeScript,
///     "$API.setGridOption(\"domLayout\", $VALUE)",
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct TextTemplate {
    source: String,
    names: BTreeSet<String>,
    tree: SyntaxTree,
}

impl TextTemplate {
    /// Compiles template text for `language`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or uses the `$_` wildcard,
    /// which has nothing to render.
    pub fn compile(language: SupportedLanguage, source: &str) -> Result<Self, SyntaxError> {
        let snippet = Snippet::compile(language, source, &CaptureSet::new())?;
        if snippet.metavariables.iter().any(|m| m.name == WILDCARD) {
            return Err(SyntaxError::invalid_template(format!(
                "'{source}' uses the $_ wildcard, which binds nothing"
            )));
        }
        let names = snippet
            .metavariables
            .iter()
            .map(|m| m.name.clone())
            .collect();
        Ok(Self {
            source: source.to_owned(),
            names,
            tree: snippet.tree,
        })
    }

    /// Returns the template source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the language the template renders.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.tree.language()
    }
}

impl Template for TextTemplate {
    fn render(&self, inputs: &RenderInputs) -> Result<Fragment, SyntaxError> {
        let mut out = SyntaxTree::empty(self.tree.language());
        let pieces = copy_node(&mut out, &self.tree, self.tree.root(), None, inputs)?;
        let root = match pieces.as_slice() {
            [Piece::Child(id)] => *id,
            _ => {
                // A template that is only a sequence placeholder renders as
                // a sequence.
                let id = out.push(NodeData {
                    kind: NodeKind::Sequence,
                    parent: None,
                    pieces: Vec::new(),
                    span: None,
                    retired: false,
                });
                reparent(&mut out, &pieces, id);
                out.set_pieces(id, pieces);
                id
            }
        };
        out.set_root(root);
        Ok(Fragment::from_tree(out))
    }

    fn placeholder_names(&self) -> BTreeSet<String> {
        self.names.clone()
    }
}

/// Copies `id` from the template tree, substituting placeholders.
///
/// Returns the pieces to splice into the new parent: one child normally, or
/// the inlined contents of a sequence input.
fn copy_node(
    out: &mut SyntaxTree,
    template: &SyntaxTree,
    id: NodeId,
    parent: Option<NodeId>,
    inputs: &RenderInputs,
) -> Result<Vec<Piece>, SyntaxError> {
    let data = template
        .data(id)
        .ok_or_else(|| SyntaxError::stale_location(id))?;

    if let NodeKind::Placeholder(placeholder) = &data.kind {
        let input = inputs.require(&placeholder.name)?;
        if input.language() != template.language() {
            return Err(SyntaxError::invalid_template(format!(
                "${} holds a {} fragment",
                placeholder.name,
                input.language()
            )));
        }
        return splice_input(out, input, parent);
    }

    let new_id = out.push(NodeData {
        kind: data.kind.clone(),
        parent,
        pieces: Vec::new(),
        span: None,
        retired: false,
    });
    let mut pieces = Vec::with_capacity(data.pieces.len());
    for piece in &data.pieces {
        match piece {
            Piece::Child(child) => {
                pieces.extend(copy_node(out, template, *child, Some(new_id), inputs)?);
            }
            Piece::Text(text) => pieces.push(Piece::Text(text.clone())),
            Piece::Trivia(text) => pieces.push(Piece::Trivia(text.clone())),
        }
    }
    out.set_pieces(new_id, pieces);
    Ok(vec![Piece::Child(new_id)])
}

fn splice_input(
    out: &mut SyntaxTree,
    input: &Fragment,
    parent: Option<NodeId>,
) -> Result<Vec<Piece>, SyntaxError> {
    let source = input.tree();
    let root = source.root();
    if !input.is_sequence() {
        return Ok(vec![Piece::Child(out.import(source, root, parent)?)]);
    }

    let data = source
        .data(root)
        .ok_or_else(|| SyntaxError::stale_location(root))?;
    let mut pieces = Vec::with_capacity(data.pieces.len());
    for piece in &data.pieces {
        pieces.push(match piece {
            Piece::Child(child) => Piece::Child(out.import(source, *child, parent)?),
            Piece::Text(text) => Piece::Text(text.clone()),
            Piece::Trivia(text) => Piece::Trivia(text.clone()),
        });
    }
    Ok(pieces)
}

fn reparent(out: &mut SyntaxTree, pieces: &[Piece], parent: NodeId) {
    for piece in pieces {
        if let Piece::Child(child) = piece {
            out.set_parent(*child, Some(parent));
        }
    }
}

type RenderFn = dyn Fn(&RenderInputs) -> Result<Fragment, SyntaxError> + Send + Sync;

/// A template backed by a closure, for replacements text cannot express.
pub struct FnTemplate {
    names: BTreeSet<String>,
    render: Box<RenderFn>,
}

impl FnTemplate {
    /// Wraps `render`, which reads the placeholders listed in `names`.
    pub fn new<I, S, F>(names: I, render: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&RenderInputs) -> Result<Fragment, SyntaxError> + Send + Sync + 'static,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            render: Box::new(render),
        }
    }
}

impl fmt::Debug for FnTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTemplate")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Template for FnTemplate {
    fn render(&self, inputs: &RenderInputs) -> Result<Fragment, SyntaxError> {
        (self.render)(inputs)
    }

    fn placeholder_names(&self) -> BTreeSet<String> {
        self.names.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn fragment(source: &str, node_text: &str) -> Fragment {
        let tree = Parser::new(SupportedLanguage::TypeScript)
            .expect("parser")
            .parse(source)
            .expect("parse");
        let id = tree
            .post_order()
            .into_iter()
            .find(|id| tree.text_of(*id) == node_text)
            .expect("node present");
        tree.extract(id).expect("extract")
    }

    #[test]
    fn renders_setter_replacement() {
        let template = TextTemplate::compile(
            SupportedLanguage::TypeScript,
            "$API.setGridOption(\"domLayout\", $VALUE)",
        )
        .expect("template");
        let mut inputs = RenderInputs::new();
        inputs.insert("API", fragment("gridApi;", "gridApi"));
        inputs.insert("VALUE", fragment("f(layout);", "layout"));

        let rendered = template.render(&inputs).expect("render");
        insta::assert_snapshot!(rendered.text(), @r#"gridApi.setGridOption("domLayout", layout)"#);
    }

    #[test]
    fn renders_sequence_inputs_inline() {
        let template =
            TextTemplate::compile(SupportedLanguage::TypeScript, "$API.refreshCells($$$ARGS)")
                .expect("template");
        let tree = Parser::new(SupportedLanguage::TypeScript)
            .expect("parser")
            .parse("f(a,  b);")
            .expect("parse");
        let args: Vec<_> = tree
            .post_order()
            .into_iter()
            .filter(|id| matches!(tree.text_of(*id).as_str(), "a" | "," | "b"))
            .filter(|id| tree.node(*id).is_some_and(|n| n.child_count() == 0))
            .collect();
        let mut inputs = RenderInputs::new();
        inputs.insert("API", fragment("api;", "api"));
        inputs.insert("ARGS", tree.extract_sequence(&args).expect("sequence"));

        let rendered = template.render(&inputs).expect("render");
        assert_eq!(rendered.text(), "api.refreshCells(a,  b)");
    }

    #[test]
    fn render_reports_missing_inputs() {
        let template =
            TextTemplate::compile(SupportedLanguage::TypeScript, "wrap($VALUE)").expect("template");

        let result = template.render(&RenderInputs::new());
        assert_eq!(result.err(), Some(SyntaxError::missing_binding("VALUE")));
    }

    #[test]
    fn compile_rejects_wildcards() {
        let result = TextTemplate::compile(SupportedLanguage::TypeScript, "wrap($_)");
        assert!(matches!(result, Err(SyntaxError::InvalidTemplate { .. })));
    }

    #[test]
    fn rendered_nodes_carry_no_spans() {
        let template =
            TextTemplate::compile(SupportedLanguage::TypeScript, "reset()").expect("template");
        let rendered = template.render(&RenderInputs::new()).expect("render");
        assert!(rendered.root_node().is_some_and(|root| root.span().is_none()));
    }

    #[test]
    fn fn_template_delegates_to_closure() {
        let template = FnTemplate::new(["VALUE"], |inputs| inputs.require("VALUE").cloned());
        let mut inputs = RenderInputs::new();
        inputs.insert("VALUE", fragment("x + 1;", "x + 1"));

        let rendered = template.render(&inputs).expect("render");
        assert_eq!(rendered.text(), "x + 1");
        assert_eq!(
            template.placeholder_names().into_iter().collect::<Vec<_>>(),
            vec!["VALUE"]
        );
    }
}
