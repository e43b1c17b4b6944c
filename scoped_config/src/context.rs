//! Context handed to test bodies and hooks.

use serde_json::Value;

use crate::cell::ConfigHandle;
use crate::gate::RuntimeBrowser;
use crate::only::has_only;
use crate::schema::ENV_KEY;
use crate::tree::{NodeId, ScopeNode, ScopeTree};

/// View of the running scope passed to bodies and hooks.
///
/// For test bodies and per-test hooks `node` is the test itself. For
/// suite-level hooks `node` is the suite and [`TestContext::current_test`]
/// names the most recent test run inside it, if any.
#[derive(Debug)]
pub struct TestContext<'a> {
    tree: &'a ScopeTree,
    node: NodeId,
    current_test: Option<NodeId>,
    config: &'a ConfigHandle,
    browser: &'a RuntimeBrowser,
}

impl<'a> TestContext<'a> {
    pub(crate) const fn new(
        tree: &'a ScopeTree,
        node: NodeId,
        current_test: Option<NodeId>,
        config: &'a ConfigHandle,
        browser: &'a RuntimeBrowser,
    ) -> Self {
        Self {
            tree,
            node,
            current_test,
            config,
            browser,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ConfigHandle {
        self.config
    }

    /// The browser executing the run.
    #[must_use]
    pub const fn browser(&self) -> &RuntimeBrowser {
        self.browser
    }

    /// The tree being run.
    #[must_use]
    pub const fn tree(&self) -> &ScopeTree {
        self.tree
    }

    /// Node whose window is active.
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.node
    }

    /// Node whose window is active, resolved against the tree.
    #[must_use]
    pub fn node(&self) -> Option<&ScopeNode> {
        self.tree.node(self.node)
    }

    /// Most recent test run in this scope.
    #[must_use]
    pub const fn current_test(&self) -> Option<NodeId> {
        self.current_test
    }

    /// Full title of the active node.
    #[must_use]
    pub fn full_title(&self) -> String {
        self.tree.full_title(self.node)
    }

    /// Whether exclusive focus is active above the current test (or above
    /// the active node when no test has run yet).
    #[must_use]
    pub fn has_only(&self) -> bool {
        has_only(self.tree, self.current_test.unwrap_or(self.node))
    }

    /// Override `key` for the rest of the active window.
    pub fn set_config(&self, key: &str, value: Value) {
        self.config.set(key, value);
    }

    /// Override one environment variable for the rest of the active window.
    pub fn set_env(&self, key: &str, value: Value) {
        self.config.set_bucket_entry(ENV_KEY, key, value);
    }
}
