//! Nested declarations lowered into a [`super::ScopeTree`].

use std::fmt;

use serde_json::Value;

use super::{NodeKind, SuiteHooks};
use crate::context::TestContext;
use crate::error::{BoxError, Phase};

/// Body of a test or hook.
pub type Callback = Box<dyn Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync>;

/// Kind of lifecycle hook attached to a suite.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookKind {
    /// Runs once before the suite's tests, inside the suite's window.
    BeforeAll,
    /// Runs before every test of the suite, inside that test's window.
    BeforeEach,
    /// Runs after every test of the suite, inside that test's window.
    AfterEach,
    /// Runs once after the suite's tests, inside the suite's window.
    AfterAll,
}

impl HookKind {
    /// Phase reported when a hook of this kind fails.
    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            Self::BeforeAll => Phase::BeforeAll,
            Self::BeforeEach => Phase::BeforeEach,
            Self::AfterEach => Phase::AfterEach,
            Self::AfterAll => Phase::AfterAll,
        }
    }
}

/// Declaration of a suite or test, optionally nesting further declarations.
///
/// # Examples
///
/// ```
/// use scoped_config::Declaration;
/// use serde_json::json;
///
/// let suite = Declaration::suite("config in suite")
///     .with_overlay(json!({"defaultCommandTimeout": 200}))
///     .before_each(|cx| {
///         assert_eq!(cx.config().get("defaultCommandTimeout"), Some(json!(200)));
///         Ok(())
///     })
///     .child(Declaration::test("test", |_| Ok(())));
/// # let _ = suite;
/// ```
pub struct Declaration {
    pub(super) kind: NodeKind,
    pub(super) title: String,
    pub(super) overlay: Option<Value>,
    pub(super) only: bool,
    pub(super) children: Vec<Self>,
    pub(super) hooks: SuiteHooks,
    pub(super) body: Option<Callback>,
}

impl Declaration {
    fn new(kind: NodeKind, title: impl Into<String>, body: Option<Callback>) -> Self {
        Self {
            kind,
            title: title.into(),
            overlay: None,
            only: false,
            children: Vec::new(),
            hooks: SuiteHooks::default(),
            body,
        }
    }

    /// Declare a suite.
    #[must_use]
    pub fn suite(title: impl Into<String>) -> Self {
        Self::new(NodeKind::Suite, title, None)
    }

    /// Declare a test with `body`.
    #[must_use]
    pub fn test<F>(title: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::new(NodeKind::Test, title, Some(Box::new(body)))
    }

    /// Attach a configuration overlay. It must be a JSON object; without
    /// this call the declaration has no overlay.
    #[must_use]
    pub fn with_overlay(mut self, overlay: Value) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Mark the declaration as an exclusive-focus target.
    #[must_use]
    pub const fn only(mut self) -> Self {
        self.only = true;
        self
    }

    /// Nest `child` under this declaration.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Nest every declaration yielded by `children`.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        self.children.extend(children);
        self
    }

    /// Attach a hook of `kind`.
    #[must_use]
    pub fn hook<F>(mut self, kind: HookKind, hook: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hooks.push(kind, Box::new(hook));
        self
    }

    /// Attach a hook run once before the suite's tests.
    #[must_use]
    pub fn before_all<F>(self, hook: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookKind::BeforeAll, hook)
    }

    /// Attach a hook run before each test of the suite.
    #[must_use]
    pub fn before_each<F>(self, hook: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookKind::BeforeEach, hook)
    }

    /// Attach a hook run after each test of the suite.
    #[must_use]
    pub fn after_each<F>(self, hook: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookKind::AfterEach, hook)
    }

    /// Attach a hook run once after the suite's tests.
    #[must_use]
    pub fn after_all<F>(self, hook: F) -> Self
    where
        F: Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookKind::AfterAll, hook)
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("overlay", &self.overlay)
            .field("only", &self.only)
            .field("children", &self.children)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
