//! Arena-backed scope tree of suites and tests.
//!
//! Nodes live in a single vector and refer to each other through [`NodeId`]
//! indices. Parent links are written only by [`ScopeTreeBuilder`], so the
//! structure is always a tree and ancestor walks cost `O(depth)`.

mod builder;
mod declaration;

use std::fmt;

pub use builder::ScopeTreeBuilder;
pub use declaration::{Callback, Declaration, HookKind};

use crate::error::{ScopeError, ScopeResult};
use crate::overlay::Overlay;
use crate::schema::ConfigSchema;

/// Opaque handle identifying a node within one [`ScopeTree`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its tree's arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node groups other nodes or carries a body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// Groups child suites and tests.
    Suite,
    /// Leaf with a body to execute.
    Test,
}

/// Hooks attached to a suite, in declaration order per kind.
#[derive(Default)]
pub struct SuiteHooks {
    before_all: Vec<Callback>,
    before_each: Vec<Callback>,
    after_each: Vec<Callback>,
    after_all: Vec<Callback>,
}

impl SuiteHooks {
    /// Hooks registered for `kind`.
    #[must_use]
    pub fn of(&self, kind: HookKind) -> &[Callback] {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
            HookKind::AfterAll => &self.after_all,
        }
    }

    pub(crate) fn push(&mut self, kind: HookKind, hook: Callback) {
        match kind {
            HookKind::BeforeAll => self.before_all.push(hook),
            HookKind::BeforeEach => self.before_each.push(hook),
            HookKind::AfterEach => self.after_each.push(hook),
            HookKind::AfterAll => self.after_all.push(hook),
        }
    }

    fn is_empty(&self) -> bool {
        self.before_all.is_empty()
            && self.before_each.is_empty()
            && self.after_each.is_empty()
            && self.after_all.is_empty()
    }
}

impl fmt::Debug for SuiteHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteHooks")
            .field("before_all", &self.before_all.len())
            .field("before_each", &self.before_each.len())
            .field("after_each", &self.after_each.len())
            .field("after_all", &self.after_all.len())
            .finish()
    }
}

/// A suite or test together with its own overlay.
pub struct ScopeNode {
    id: NodeId,
    kind: NodeKind,
    title: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    overlay: Overlay,
    only: bool,
    hooks: SuiteHooks,
    body: Option<Callback>,
}

impl ScopeNode {
    /// Identifier of this node.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Suite or test.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Title given at declaration.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Enclosing suite, `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Overlay declared directly on this node.
    #[must_use]
    pub const fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Whether this node carries the exclusive-focus marker.
    #[must_use]
    pub const fn is_only(&self) -> bool {
        self.only
    }

    /// Hooks attached to this node; always empty for tests.
    #[must_use]
    pub const fn hooks(&self) -> &SuiteHooks {
        &self.hooks
    }

    /// Body of a test; `None` for suites.
    #[must_use]
    pub fn body(&self) -> Option<&Callback> {
        self.body.as_ref()
    }
}

impl fmt::Debug for ScopeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("overlay", &self.overlay)
            .field("only", &self.only)
            .field("hooks", &self.hooks)
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Immutable tree of suites and tests produced during collection.
#[derive(Debug)]
pub struct ScopeTree {
    schema: ConfigSchema,
    nodes: Vec<ScopeNode>,
}

impl ScopeTree {
    /// Lower a nested declaration into a tree.
    ///
    /// A structural error aborts only the branch in which it occurs;
    /// collection carries on with the remaining branches and every error is
    /// returned together.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Structural`] for a single malformed declaration
    /// or [`ScopeError::Aggregate`] when several branches are malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_config::{ConfigSchema, Declaration, ScopeTree};
    /// use serde_json::json;
    ///
    /// let tree = ScopeTree::build(
    ///     ConfigSchema::default(),
    ///     Declaration::suite("root")
    ///         .with_overlay(json!({"foo": true}))
    ///         .child(Declaration::test("has foo", |_| Ok(()))),
    /// )?;
    /// assert_eq!(tree.tests().len(), 1);
    /// # Ok::<_, scoped_config::ScopeError>(())
    /// ```
    pub fn build(schema: ConfigSchema, root: Declaration) -> ScopeResult<Self> {
        ScopeTreeBuilder::new(schema).declare(root)
    }

    /// Schema the tree's overlays were validated against.
    #[must_use]
    pub const fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    /// Identifier of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes; never true for a built tree.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ScopeNode> {
        self.nodes.get(id.0)
    }

    /// Look up a node, failing for ids from another tree.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownNode`] when `id` is out of range.
    pub fn get(&self, id: NodeId) -> ScopeResult<&ScopeNode> {
        self.node(id).ok_or(ScopeError::UnknownNode(id))
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).and_then(ScopeNode::parent),
        }
    }

    /// Chain of nodes from the root down to `id` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownNode`] when `id` is out of range.
    pub fn path_from_root(&self, id: NodeId) -> ScopeResult<Vec<&ScopeNode>> {
        let mut chain = vec![self.get(id)?];
        chain.extend(self.ancestors(id));
        chain.reverse();
        Ok(chain)
    }

    /// Titles from the root to `id`, skipping empty ones, joined by ` > `.
    #[must_use]
    pub fn full_title(&self, id: NodeId) -> String {
        self.path_from_root(id)
            .map(|chain| {
                chain
                    .iter()
                    .map(|node| node.title())
                    .filter(|title| !title.is_empty())
                    .collect::<Vec<_>>()
                    .join(" > ")
            })
            .unwrap_or_default()
    }

    /// All tests in depth-first declaration order.
    #[must_use]
    pub fn tests(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_tests(self.root(), &mut out);
        out
    }

    /// Tests within the subtree rooted at `id`, in declaration order.
    #[must_use]
    pub fn tests_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_tests(id, &mut out);
        out
    }

    fn collect_tests(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node.kind {
            NodeKind::Test => out.push(id),
            NodeKind::Suite => {
                for child in &node.children {
                    self.collect_tests(*child, out);
                }
            }
        }
    }

    /// Whether any node in the tree carries the only marker.
    #[must_use]
    pub fn has_exclusive(&self) -> bool {
        self.nodes.iter().any(ScopeNode::is_only)
    }

    /// Whether `id` or one of its ancestors carries the only marker.
    #[must_use]
    pub fn is_focused(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(ScopeNode::is_only) || self.ancestors(id).any(ScopeNode::is_only)
    }
}

/// Iterator over a node's strict ancestors, nearest first.
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a ScopeTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ScopeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.node(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}
