//! Arena-backed syntax trees with index-addressed locations.
//!
//! A [`SyntaxTree`] owns every node in a flat arena. Nodes are addressed by
//! [`NodeId`], which is the tree location used by the matcher and the
//! rewriter. Edits go through [`SyntaxTree::replace_at`] and
//! [`SyntaxTree::remove_at`]; the replaced subtree is retired so any
//! location still pointing into it is rejected instead of aliasing the new
//! content.
//!
//! Each node keeps the text between its children as trivia, so printing an
//! untouched tree reproduces the parsed source byte for byte.

mod build;
#[cfg(test)]
mod tests;

use std::fmt;

use crate::capture::NodeClass;
use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::metavariables::MetaVarKind;
use crate::parser::SyntaxErrorInfo;
use crate::position::Span;

pub(crate) use build::TreeBuilder;

/// Index of a node inside a [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    const fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of node shapes the engine distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A named grammar node such as `call_expression` or `identifier`.
    Syntax(&'static str),
    /// An anonymous grammar token such as `(` or `.`.
    Token(&'static str),
    /// A sentinel marking a metavariable inside a pattern or template.
    Placeholder(Placeholder),
    /// A synthetic container holding a run of captured sibling nodes.
    Sequence,
}

impl NodeKind {
    /// Returns the grammar kind name, if this is a grammar node or token.
    #[must_use]
    pub const fn grammar_name(&self) -> Option<&'static str> {
        match self {
            Self::Syntax(name) | Self::Token(name) => Some(name),
            Self::Placeholder(_) | Self::Sequence => None,
        }
    }

    /// Returns the placeholder description, if this node is a sentinel.
    #[must_use]
    pub const fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Self::Placeholder(placeholder) => Some(placeholder),
            Self::Syntax(_) | Self::Token(_) | Self::Sequence => None,
        }
    }
}

/// A metavariable sentinel embedded in a pattern or template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Metavariable name without the `$` prefix.
    pub name: String,
    /// Whether the placeholder stands for one node or a run of nodes.
    pub kind: MetaVarKind,
    /// The class of node the placeholder may bind.
    pub class: NodeClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    /// Text of a leaf node.
    Text(String),
    /// Whitespace and comments between children.
    Trivia(String),
    /// A child node.
    Child(NodeId),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) pieces: Vec<Piece>,
    pub(crate) span: Option<Span>,
    pub(crate) retired: bool,
}

/// A parsed (and possibly edited) syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    language: SupportedLanguage,
    nodes: Vec<NodeData>,
    root: NodeId,
    errors: Vec<SyntaxErrorInfo>,
}

impl SyntaxTree {
    pub(crate) fn empty(language: SupportedLanguage) -> Self {
        Self {
            language,
            nodes: Vec::new(),
            root: NodeId(0),
            errors: Vec::new(),
        }
    }

    /// Returns the language the tree was parsed as.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the location of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a view of the root node.
    #[must_use]
    pub fn root_node(&self) -> Option<NodeRef<'_>> {
        self.node(self.root)
    }

    /// Returns a view of the node at `id`, or `None` if it is stale.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let data = self.live_data(id)?;
        Some(NodeRef {
            tree: self,
            id,
            data,
        })
    }

    /// Returns whether `id` still refers to a node reachable from the root.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.live_data(id).is_some()
    }

    /// Returns whether the parser reported syntax errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the syntax errors reported by the parser.
    #[must_use]
    pub fn errors(&self) -> &[SyntaxErrorInfo] {
        &self.errors
    }

    /// Prints the whole tree back to source text.
    #[must_use]
    pub fn print(&self) -> String {
        self.text_of(self.root)
    }

    /// Returns the printed text of the subtree rooted at `id`.
    ///
    /// Stale locations print as an empty string.
    #[must_use]
    pub fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    /// Returns every live node in post-order (children before parents).
    #[must_use]
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            let Some(data) = self.live_data(id) else {
                continue;
            };
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in child_ids(data).rev() {
                stack.push((child, false));
            }
        }
        order
    }

    /// Copies the subtree at `id` into a standalone [`Fragment`].
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::StaleLocation`] if `id` is not live.
    pub fn extract(&self, id: NodeId) -> Result<Fragment, SyntaxError> {
        if !self.is_live(id) {
            return Err(SyntaxError::stale_location(id));
        }
        let mut tree = Self::empty(self.language);
        tree.root = tree.import(self, id, None)?;
        Ok(Fragment { tree })
    }

    /// Replaces the node at `id` with `fragment`, returning the new location.
    ///
    /// The replaced subtree is retired: its locations become stale.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or the fragment belongs to another
    /// language.
    pub fn replace_at(&mut self, id: NodeId, fragment: &Fragment) -> Result<NodeId, SyntaxError> {
        let parent = self
            .live_data(id)
            .ok_or_else(|| SyntaxError::stale_location(id))?
            .parent;
        if fragment.language() != self.language {
            return Err(SyntaxError::invalid_edit(format!(
                "cannot graft a {} fragment into a {} tree",
                fragment.language(),
                self.language
            )));
        }

        let new_id = self.import(&fragment.tree, fragment.tree.root, parent)?;
        match parent {
            Some(parent_id) => self.swap_child(parent_id, id, Some(new_id))?,
            None => self.root = new_id,
        }
        self.retire(id);
        Ok(new_id)
    }

    /// Removes the node at `id` from its parent.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is stale or refers to the root.
    pub fn remove_at(&mut self, id: NodeId) -> Result<(), SyntaxError> {
        let parent = self
            .live_data(id)
            .ok_or_else(|| SyntaxError::stale_location(id))?
            .parent
            .ok_or_else(|| SyntaxError::invalid_edit("the root node cannot be removed"))?;
        self.swap_child(parent, id, None)?;
        self.retire(id);
        Ok(())
    }

    /// Copies a run of sibling nodes into a [`Fragment`] rooted at a
    /// [`NodeKind::Sequence`] node.
    ///
    /// The trivia between the siblings is kept so the run prints as it did
    /// in the source. An empty run yields an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if any location is stale or the nodes are not
    /// consecutive children of one parent.
    pub fn extract_sequence(&self, ids: &[NodeId]) -> Result<Fragment, SyntaxError> {
        let mut tree = Self::empty(self.language);
        let root = tree.push(NodeData {
            kind: NodeKind::Sequence,
            parent: None,
            pieces: Vec::new(),
            span: None,
            retired: false,
        });
        tree.root = root;

        let (Some(first), Some(last)) = (ids.first(), ids.last()) else {
            return Ok(Fragment { tree });
        };
        let parent = self
            .live_data(*first)
            .ok_or_else(|| SyntaxError::stale_location(*first))?
            .parent
            .ok_or_else(|| SyntaxError::invalid_edit("a sequence cannot contain the root"))?;
        let parent_pieces = &self
            .live_data(parent)
            .ok_or_else(|| SyntaxError::stale_location(parent))?
            .pieces;
        let start = parent_pieces.iter().position(|p| *p == Piece::Child(*first));
        let end = parent_pieces.iter().position(|p| *p == Piece::Child(*last));
        let (Some(start), Some(end)) = (start, end) else {
            return Err(SyntaxError::invalid_edit(format!(
                "{first}..{last} are not children of {parent}"
            )));
        };

        let run = parent_pieces.get(start..=end).unwrap_or_default();
        let in_run = run.iter().filter(|p| matches!(p, Piece::Child(_))).count();
        if in_run != ids.len() {
            return Err(SyntaxError::invalid_edit(format!(
                "{first}..{last} is not a contiguous run of siblings"
            )));
        }

        let mut pieces = Vec::with_capacity(run.len());
        for piece in run {
            pieces.push(match piece {
                Piece::Child(child) => Piece::Child(tree.import(self, *child, Some(root))?),
                Piece::Text(text) => Piece::Text(text.clone()),
                Piece::Trivia(text) => Piece::Trivia(text.clone()),
            });
        }
        tree.set_pieces(root, pieces);
        Ok(Fragment { tree })
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    fn live_data(&self, id: NodeId) -> Option<&NodeData> {
        self.data(id).filter(|data| !data.retired)
    }

    pub(crate) fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(data);
        id
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(data) = self.nodes.get_mut(id.index()) {
            data.parent = parent;
        }
    }

    pub(crate) fn set_pieces(&mut self, id: NodeId, pieces: Vec<Piece>) {
        if let Some(data) = self.nodes.get_mut(id.index()) {
            data.pieces = pieces;
        }
    }

    /// Deep-copies the subtree at `id` of `other` into this arena.
    pub(crate) fn import(
        &mut self,
        other: &Self,
        id: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, SyntaxError> {
        let source = other
            .data(id)
            .ok_or_else(|| SyntaxError::stale_location(id))?;
        let new_id = self.push(NodeData {
            kind: source.kind.clone(),
            parent,
            pieces: Vec::new(),
            span: source.span.clone(),
            retired: false,
        });

        let mut pieces = Vec::with_capacity(source.pieces.len());
        for piece in &source.pieces {
            pieces.push(match piece {
                Piece::Child(child) => Piece::Child(self.import(other, *child, Some(new_id))?),
                Piece::Text(text) => Piece::Text(text.clone()),
                Piece::Trivia(text) => Piece::Trivia(text.clone()),
            });
        }
        self.set_pieces(new_id, pieces);
        Ok(new_id)
    }

    fn swap_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: Option<NodeId>,
    ) -> Result<(), SyntaxError> {
        let data = self
            .nodes
            .get_mut(parent.index())
            .ok_or_else(|| SyntaxError::stale_location(parent))?;
        let position = data
            .pieces
            .iter()
            .position(|piece| *piece == Piece::Child(old))
            .ok_or_else(|| {
                SyntaxError::invalid_edit(format!("{old} is not a child of {parent}"))
            })?;
        match new {
            Some(new_id) => {
                if let Some(piece) = data.pieces.get_mut(position) {
                    *piece = Piece::Child(new_id);
                }
            }
            None => {
                data.pieces.remove(position);
            }
        }
        Ok(())
    }

    fn retire(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(data) = self.nodes.get_mut(current.index()) else {
                continue;
            };
            data.retired = true;
            stack.extend(child_ids(data));
        }
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.live_data(id) else {
            return;
        };
        for piece in &data.pieces {
            match piece {
                Piece::Text(text) | Piece::Trivia(text) => out.push_str(text),
                Piece::Child(child) => self.write_text(*child, out),
            }
        }
    }
}

fn child_ids(data: &NodeData) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
    data.pieces.iter().filter_map(|piece| match piece {
        Piece::Child(id) => Some(*id),
        Piece::Text(_) | Piece::Trivia(_) => None,
    })
}

/// A borrowed view of one live node.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
    data: &'t NodeData,
}

impl<'t> NodeRef<'t> {
    /// Returns the node's location.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the tree that owns this node.
    #[must_use]
    pub const fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    /// Returns the node's kind.
    #[must_use]
    pub const fn kind(&self) -> &'t NodeKind {
        &self.data.kind
    }

    /// Returns the span in the originally parsed text, if the node was parsed.
    #[must_use]
    pub const fn span(&self) -> Option<&'t Span> {
        self.data.span.as_ref()
    }

    /// Returns the parent node, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data.parent.and_then(|parent| self.tree.node(parent))
    }

    /// Iterates over the node's children (trivia excluded).
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        let tree = self.tree;
        child_ids(self.data).filter_map(move |child| tree.node(child))
    }

    /// Iterates over children that are named nodes or placeholders.
    pub fn named_children(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        self.children()
            .filter(|child| !matches!(child.kind(), NodeKind::Token(_)))
    }

    /// Returns the number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        child_ids(self.data).count()
    }

    /// Returns the first child of the given grammar kind.
    #[must_use]
    pub fn child_of_kind(&self, kind: &str) -> Option<Self> {
        self.children()
            .find(|child| child.kind().grammar_name() == Some(kind))
    }

    /// Returns the leaf text, or `None` if the node has children.
    #[must_use]
    pub fn leaf_text(&self) -> Option<&'t str> {
        match self.data.pieces.as_slice() {
            [Piece::Text(text)] => Some(text.as_str()),
            [] => Some(""),
            _ => None,
        }
    }

    /// Returns the printed text of this subtree.
    #[must_use]
    pub fn text(&self) -> String {
        self.tree.text_of(self.id)
    }
}

/// Returns whether two subtrees have the same shape and leaf text.
///
/// Trivia is ignored, so `f(a,b)` and `f(a, b)` are equal.
#[must_use]
pub fn structurally_equal(left: NodeRef<'_>, right: NodeRef<'_>) -> bool {
    if left.kind() != right.kind() {
        return false;
    }
    match (left.leaf_text(), right.leaf_text()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => {
            left.child_count() == right.child_count()
                && left
                    .children()
                    .zip(right.children())
                    .all(|(a, b)| structurally_equal(a, b))
        }
        _ => false,
    }
}

/// A standalone tree fragment produced by extraction or template rendering.
///
/// A fragment has no effect on any document until it is grafted with
/// [`SyntaxTree::replace_at`].
#[derive(Debug, Clone)]
pub struct Fragment {
    tree: SyntaxTree,
}

impl Fragment {
    pub(crate) const fn from_tree(tree: SyntaxTree) -> Self {
        Self { tree }
    }

    pub(crate) fn into_tree(self) -> SyntaxTree {
        self.tree
    }

    /// Returns whether the fragment is a run of siblings rather than a node.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.root_node()
            .is_some_and(|root| matches!(root.kind(), NodeKind::Sequence))
    }

    /// Returns the fragment's language.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.tree.language()
    }

    /// Returns the fragment's backing tree.
    #[must_use]
    pub const fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Returns a view of the fragment's root node.
    #[must_use]
    pub fn root_node(&self) -> Option<NodeRef<'_>> {
        self.tree.root_node()
    }

    /// Prints the fragment back to source text.
    #[must_use]
    pub fn text(&self) -> String {
        self.tree.print()
    }

    /// Returns whether two fragments are structurally equal.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (self.root_node(), other.root_node()) {
            (Some(left), Some(right)) => structurally_equal(left, right),
            _ => false,
        }
    }
}
