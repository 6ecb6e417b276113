//! Bindings from metavariable names to the tree locations they captured.

use std::collections::BTreeMap;

use crate::error::SyntaxError;
use crate::metavariables::WILDCARD;
use crate::template::RenderInputs;
use crate::tree::{NodeId, SyntaxTree, structurally_equal};

/// What a single metavariable captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A single node (`$NAME`).
    Single(NodeId),
    /// A run of consecutive sibling nodes (`$$$NAME`), possibly empty.
    Multiple(Vec<NodeId>),
}

impl Binding {
    /// Returns the node of a single-node binding.
    #[must_use]
    pub const fn as_single(&self) -> Option<NodeId> {
        match self {
            Self::Single(id) => Some(*id),
            Self::Multiple(_) => None,
        }
    }

    /// Returns every node in the binding.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Multiple(ids) => ids,
        }
    }
}

/// Captured locations keyed by metavariable name.
///
/// A `Bindings` value only exists for a successful match and then holds every
/// name the matcher binds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    inner: BTreeMap<String, Binding>,
}

impl Bindings {
    /// Returns the binding for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.inner.get(name)
    }

    /// Returns the node bound to a single-node metavariable.
    #[must_use]
    pub fn single(&self, name: &str) -> Option<NodeId> {
        self.get(name).and_then(Binding::as_single)
    }

    /// Iterates over the bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Iterates over every binding.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.inner.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    /// Returns the number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copies every captured subtree out of `tree` as template inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound location is stale.
    pub fn to_render_inputs(&self, tree: &SyntaxTree) -> Result<RenderInputs, SyntaxError> {
        let mut inputs = RenderInputs::new();
        for (name, binding) in &self.inner {
            let fragment = match binding {
                Binding::Single(id) => tree.extract(*id)?,
                Binding::Multiple(ids) => tree.extract_sequence(ids)?,
            };
            inputs.insert(name.clone(), fragment);
        }
        Ok(inputs)
    }

    /// Records `binding` under `name`.
    ///
    /// The wildcard never binds. A name that is already bound only accepts a
    /// structurally equal capture; otherwise the match must fail.
    pub(crate) fn insert_consistent(
        &mut self,
        tree: &SyntaxTree,
        name: &str,
        binding: Binding,
    ) -> bool {
        if name == WILDCARD {
            return true;
        }

        let Some(existing) = self.inner.get(name) else {
            self.inner.insert(name.to_owned(), binding);
            return true;
        };

        let (left, right) = (existing.nodes(), binding.nodes());
        let same_shape = matches!(
            (existing, &binding),
            (Binding::Single(_), Binding::Single(_)) | (Binding::Multiple(_), Binding::Multiple(_))
        );
        same_shape
            && left.len() == right.len()
            && left.iter().zip(right).all(|(a, b)| {
                match (tree.node(*a), tree.node(*b)) {
                    (Some(a), Some(b)) => structurally_equal(a, b),
                    _ => false,
                }
            })
    }
}
