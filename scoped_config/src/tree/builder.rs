//! Imperative construction of scope trees and lowering of declarations.

use serde_json::Value;
use tracing::debug;

use super::{Callback, Declaration, HookKind, NodeId, NodeKind, ScopeNode, ScopeTree, SuiteHooks};
use crate::context::TestContext;
use crate::error::{BoxError, ScopeError, ScopeResult};
use crate::overlay::Overlay;
use crate::schema::ConfigSchema;

/// Builder that appends nodes to a scope tree one at a time.
///
/// # Examples
///
/// ```
/// use scoped_config::{ConfigSchema, ScopeTreeBuilder};
/// use serde_json::json;
///
/// let mut builder = ScopeTreeBuilder::new(ConfigSchema::default());
/// let root = builder.add_root("per-test config", Some(json!({"env": {"FOO": "a"}})))?;
/// let test = builder.add_test(root, "reads FOO", None, |_| Ok(()))?;
/// let tree = builder.finish()?;
/// assert_eq!(tree.tests(), vec![test]);
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[derive(Debug)]
pub struct ScopeTreeBuilder {
    schema: ConfigSchema,
    nodes: Vec<ScopeNode>,
}

struct NodeSpec {
    kind: NodeKind,
    title: String,
    overlay: Overlay,
    only: bool,
    hooks: SuiteHooks,
    body: Option<Callback>,
}

impl ScopeTreeBuilder {
    /// Create an empty builder validating overlays against `schema`.
    #[must_use]
    pub const fn new(schema: ConfigSchema) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
        }
    }

    /// Declare the root suite. `None` declares no overlay.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Structural`] when a root already exists or the
    /// overlay is malformed.
    pub fn add_root(
        &mut self,
        title: impl Into<String>,
        overlay: Option<Value>,
    ) -> ScopeResult<NodeId> {
        let name: String = title.into();
        if !self.nodes.is_empty() {
            return Err(ScopeError::structural(name, "the tree already has a root"));
        }
        let validated = self.overlay(None, &name, overlay)?;
        Ok(self.push(
            None,
            NodeSpec {
                kind: NodeKind::Suite,
                title: name,
                overlay: validated,
                only: false,
                hooks: SuiteHooks::default(),
                body: None,
            },
        ))
    }

    /// Declare a suite under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownNode`] for an unknown parent and
    /// [`ScopeError::Structural`] when the parent is a test or the overlay
    /// is malformed.
    pub fn add_suite(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
        overlay: Option<Value>,
    ) -> ScopeResult<NodeId> {
        let name: String = title.into();
        self.ensure_suite(parent, &name, "tests cannot declare children")?;
        let validated = self.overlay(Some(parent), &name, overlay)?;
        Ok(self.push(
            Some(parent),
            NodeSpec {
                kind: NodeKind::Suite,
                title: name,
                overlay: validated,
                only: false,
                hooks: SuiteHooks::default(),
                body: None,
            },
        ))
    }

    /// Declare a test under `parent`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ScopeTreeBuilder::add_suite`].
    pub fn add_test<F>(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
        overlay: Option<Value>,
        body: F,
    ) -> ScopeResult<NodeId>
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name: String = title.into();
        self.ensure_suite(parent, &name, "tests cannot declare children")?;
        let validated = self.overlay(Some(parent), &name, overlay)?;
        Ok(self.push(
            Some(parent),
            NodeSpec {
                kind: NodeKind::Test,
                title: name,
                overlay: validated,
                only: false,
                hooks: SuiteHooks::default(),
                body: Some(Box::new(body)),
            },
        ))
    }

    /// Attach a hook to `suite`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownNode`] for an unknown node and
    /// [`ScopeError::Structural`] when the node is a test.
    pub fn add_hook<F>(&mut self, suite: NodeId, kind: HookKind, hook: F) -> ScopeResult<()>
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.ensure_suite(suite, "hook", "hooks can only be attached to suites")?;
        let node = self
            .nodes
            .get_mut(suite.index())
            .ok_or(ScopeError::UnknownNode(suite))?;
        node.hooks.push(kind, Box::new(hook));
        Ok(())
    }

    /// Mark `id` as an exclusive-focus target.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownNode`] for an unknown node.
    pub fn mark_only(&mut self, id: NodeId) -> ScopeResult<()> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(ScopeError::UnknownNode(id))?;
        node.only = true;
        Ok(())
    }

    /// Freeze the builder into an immutable tree.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Structural`] when no root was declared.
    pub fn finish(self) -> ScopeResult<ScopeTree> {
        if self.nodes.is_empty() {
            return Err(ScopeError::structural("", "no root suite was declared"));
        }
        debug!(nodes = self.nodes.len(), "scope tree collected");
        Ok(ScopeTree {
            schema: self.schema,
            nodes: self.nodes,
        })
    }

    /// Lower `root` and every nested declaration, then freeze the tree.
    ///
    /// # Errors
    ///
    /// Returns every structural error found, aggregated when there is more
    /// than one.
    pub fn declare(mut self, root: Declaration) -> ScopeResult<ScopeTree> {
        if !self.nodes.is_empty() {
            return Err(ScopeError::structural(root.title, "the tree already has a root"));
        }
        let mut errors = Vec::new();
        self.lower(None, root, &mut errors);
        if let Some(err) = ScopeError::try_aggregate(errors) {
            return Err(err);
        }
        self.finish()
    }

    fn lower(&mut self, parent: Option<NodeId>, decl: Declaration, errors: &mut Vec<ScopeError>) {
        let Declaration {
            kind,
            title,
            overlay,
            only,
            children,
            hooks,
            body,
        } = decl;
        if kind == NodeKind::Test && !children.is_empty() {
            errors.push(ScopeError::structural(
                self.path(parent, &title),
                "tests cannot declare children",
            ));
            return;
        }
        if kind == NodeKind::Test && !hooks.is_empty() {
            errors.push(ScopeError::structural(
                self.path(parent, &title),
                "hooks can only be attached to suites",
            ));
            return;
        }
        let validated = match self.overlay(parent, &title, overlay) {
            Ok(checked) => checked,
            Err(err) => {
                errors.push(err);
                return;
            }
        };
        let id = self.push(
            parent,
            NodeSpec {
                kind,
                title,
                overlay: validated,
                only,
                hooks,
                body,
            },
        );
        for child in children {
            self.lower(Some(id), child, errors);
        }
    }

    fn overlay(
        &self,
        parent: Option<NodeId>,
        title: &str,
        value: Option<Value>,
    ) -> ScopeResult<Overlay> {
        let Some(declared) = value else {
            return Ok(Overlay::empty());
        };
        Overlay::from_value(declared, &self.schema)
            .map_err(|err| ScopeError::structural(self.path(parent, title), err.to_string()))
    }

    fn ensure_suite(&self, parent: NodeId, title: &str, message: &str) -> ScopeResult<()> {
        let node = self
            .nodes
            .get(parent.index())
            .ok_or(ScopeError::UnknownNode(parent))?;
        if node.kind == NodeKind::Test {
            return Err(ScopeError::structural(self.path(Some(parent), title), message));
        }
        Ok(())
    }

    fn push(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            id,
            kind: spec.kind,
            title: spec.title,
            parent,
            children: Vec::new(),
            overlay: spec.overlay,
            only: spec.only,
            hooks: spec.hooks,
            body: spec.body,
        });
        if let Some(owner) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            owner.children.push(id);
        }
        id
    }

    fn path(&self, parent: Option<NodeId>, title: &str) -> String {
        let mut titles = vec![title];
        let mut cursor = parent;
        while let Some(node) = cursor.and_then(|id| self.nodes.get(id.index())) {
            titles.push(&node.title);
            cursor = node.parent;
        }
        titles.reverse();
        titles
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}
