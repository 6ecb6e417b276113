//! Replacement and deprecation rules.
//!
//! A [`Replacement`] pairs a matcher with a template. It never edits a tree
//! itself: [`Replacement::exec`] reports the matched location, its bindings
//! and the rendered fragment, and the rewriter decides whether to graft it.

use std::fmt;

use crate::error::SyntaxError;
use crate::matcher::{Bindings, TreeMatcher};
use crate::template::Template;
use crate::tree::{Fragment, NodeId, SyntaxTree};

/// The result of executing a replacement at one location.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Location of the matched node.
    pub node: NodeId,
    /// What the matcher captured.
    pub refs: Bindings,
    /// The rendered replacement, not yet grafted.
    pub replacement: Fragment,
}

/// A rule that rewrites matching nodes.
pub struct Replacement {
    id: String,
    matcher: Box<dyn TreeMatcher>,
    template: Box<dyn Template>,
    subject: Option<String>,
    warning: Option<String>,
    dangerous: bool,
}

impl Replacement {
    /// Pairs `matcher` with `template`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidTemplate`] if the template reads a
    /// placeholder the matcher does not bind on every match.
    pub fn new(
        id: impl Into<String>,
        matcher: impl TreeMatcher + 'static,
        template: impl Template + 'static,
    ) -> Result<Self, SyntaxError> {
        let rule_id = id.into();
        let bound = matcher.capture_names();
        if let Some(unbound) = template
            .placeholder_names()
            .into_iter()
            .find(|name| !bound.contains(name))
        {
            return Err(SyntaxError::invalid_template(format!(
                "rule '{rule_id}' renders ${unbound}, which its pattern never binds"
            )));
        }

        Ok(Self {
            id: rule_id,
            matcher: Box::new(matcher),
            template: Box::new(template),
            subject: None,
            warning: None,
            dangerous: false,
        })
    }

    /// Names the capture the semantic guard must approve.
    ///
    /// # Errors
    ///
    /// Returns an error if the matcher does not bind `subject`.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Result<Self, SyntaxError> {
        let name = subject.into();
        check_subject(&self.id, self.matcher.as_ref(), &name)?;
        self.subject = Some(name);
        Ok(self)
    }

    /// Records `warning` every time the replacement is applied.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Marks the replacement as a dangerous edit.
    #[must_use]
    pub const fn dangerous(mut self) -> Self {
        self.dangerous = true;
        self
    }

    /// Returns the rule identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the guarded capture name, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the warning recorded on application.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Returns whether the replacement needs explicit opt-in.
    #[must_use]
    pub const fn is_dangerous(&self) -> bool {
        self.dangerous
    }

    /// Matches the node at `node` without rendering.
    #[must_use]
    pub fn match_at(&self, tree: &SyntaxTree, node: NodeId) -> Option<Bindings> {
        self.matcher.match_at(tree, node)
    }

    /// Matches the node at `node` and renders the template.
    ///
    /// Returns `None` when the node does not match. The tree is never
    /// modified.
    pub fn exec(&self, tree: &SyntaxTree, node: NodeId) -> Option<Result<Execution, SyntaxError>> {
        let refs = self.match_at(tree, node)?;
        Some(
            refs.to_render_inputs(tree)
                .and_then(|inputs| self.template.render(&inputs))
                .map(|replacement| Execution {
                    node,
                    refs,
                    replacement,
                }),
        )
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacement")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("warning", &self.warning)
            .field("dangerous", &self.dangerous)
            .finish_non_exhaustive()
    }
}

/// A usage that must be migrated by hand.
pub struct Deprecation {
    id: String,
    matcher: Box<dyn TreeMatcher>,
    message: String,
    subject: Option<String>,
}

impl Deprecation {
    /// Creates a deprecation reported with `message`.
    pub fn new(
        id: impl Into<String>,
        matcher: impl TreeMatcher + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            matcher: Box::new(matcher),
            message: message.into(),
            subject: None,
        }
    }

    /// Names the capture the semantic guard must approve.
    ///
    /// # Errors
    ///
    /// Returns an error if the matcher does not bind `subject`.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Result<Self, SyntaxError> {
        let name = subject.into();
        check_subject(&self.id, self.matcher.as_ref(), &name)?;
        self.subject = Some(name);
        Ok(self)
    }

    /// Returns the rule identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the message reported for each match.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the guarded capture name, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Matches the node at `node`.
    #[must_use]
    pub fn match_at(&self, tree: &SyntaxTree, node: NodeId) -> Option<Bindings> {
        self.matcher.match_at(tree, node)
    }
}

impl fmt::Debug for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deprecation")
            .field("id", &self.id)
            .field("message", &self.message)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

fn check_subject(id: &str, matcher: &dyn TreeMatcher, subject: &str) -> Result<(), SyntaxError> {
    if matcher.capture_names().contains(subject) {
        Ok(())
    } else {
        Err(SyntaxError::invalid_metavariable(format!(
            "rule '{id}' guards ${subject}, which its pattern never binds"
        )))
    }
}
