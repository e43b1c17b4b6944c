//! Activation lifecycle of the observable configuration around one test.
//!
//! For every test the controller resolves the effective configuration,
//! consults the browser gate and, when the test proceeds, swaps the
//! baseline-plus-effective view into the cell for exactly the span of the
//! `before_each` hooks, the body and the `after_each` hooks. Restoration
//! happens on every exit path; panics are caught and reported as failures
//! and any unwinding that escapes is still covered by the guard's `Drop`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info};

use crate::baseline::Baseline;
use crate::cell::{ConfigCell, ConfigHandle, Snapshot};
use crate::context::TestContext;
use crate::error::{BodyFailure, Phase, ScopeError, ScopeResult};
use crate::gate::{GateDecision, RuntimeBrowser, should_run};
use crate::resolve::resolve;
use crate::tree::{Callback, HookKind, NodeId, NodeKind, ScopeNode, ScopeTree};

/// Result of running one test.
#[derive(Debug)]
#[non_exhaustive]
pub enum TestOutcome {
    /// Body and hooks completed without error.
    Passed,
    /// The body or one of its hooks failed.
    Failed(BodyFailure),
    /// Excluded by the browser gate; not a failure.
    Skipped {
        /// Browser selection that did not match.
        requested: String,
    },
    /// Not selected because exclusive focus is active elsewhere.
    Filtered,
}

impl TestOutcome {
    /// Whether the test passed.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Whether the test failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Whether the browser gate excluded the test.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// The failure, if the test failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&BodyFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Owner of the configuration cell and the activation windows opened on it.
///
/// # Examples
///
/// ```
/// use scoped_config::{
///     Baseline, ConfigSchema, Declaration, RuntimeBrowser, ScopeController, ScopeTree,
/// };
/// use serde_json::json;
///
/// let tree = ScopeTree::build(
///     ConfigSchema::default(),
///     Declaration::suite("per-test config").child(
///         Declaration::test("sets timeout", |cx| {
///             assert_eq!(cx.config().get("defaultCommandTimeout"), Some(json!(200)));
///             Ok(())
///         })
///         .with_overlay(json!({"defaultCommandTimeout": 200})),
///     ),
/// )?;
/// let controller = ScopeController::new(
///     Baseline::from_value(&json!({"defaultCommandTimeout": 4000}))?,
///     RuntimeBrowser::new("chrome", "chromium"),
/// );
/// let outcome = controller.run_test(&tree, tree.tests()[0])?;
/// assert!(outcome.is_passed());
/// assert_eq!(controller.config().get("defaultCommandTimeout"), Some(json!(4000)));
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[derive(Debug)]
pub struct ScopeController {
    cell: ConfigCell,
    baseline: Baseline,
    browser: RuntimeBrowser,
}

impl ScopeController {
    /// Create a controller whose cell starts out holding `baseline`.
    #[must_use]
    pub fn new(baseline: Baseline, browser: RuntimeBrowser) -> Self {
        Self {
            cell: ConfigCell::new(baseline.as_map().clone()),
            baseline,
            browser,
        }
    }

    /// Read handle on the observable configuration.
    #[must_use]
    pub fn config(&self) -> ConfigHandle {
        self.cell.handle()
    }

    /// Baseline restored between windows.
    #[must_use]
    pub const fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Browser the run executes under.
    #[must_use]
    pub const fn browser(&self) -> &RuntimeBrowser {
        &self.browser
    }

    /// Browser gate verdict for `test`, without opening a window.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownNode`] when `test` is not part of `tree`.
    pub fn gate(&self, tree: &ScopeTree, test: NodeId) -> ScopeResult<GateDecision> {
        Ok(should_run(&resolve(tree, test)?, &self.browser))
    }

    /// Run the test `test` inside its own activation window.
    ///
    /// Body and hook failures are returned as [`TestOutcome::Failed`] after
    /// the previous configuration has been restored.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Structural`] when `test` is a suite,
    /// [`ScopeError::UnknownNode`] when it is not part of `tree`, and
    /// [`ScopeError::LeakDetected`] when the cell cannot be returned to its
    /// pre-test value.
    pub fn run_test(&self, tree: &ScopeTree, test: NodeId) -> ScopeResult<TestOutcome> {
        let node = tree.get(test)?;
        let title = tree.full_title(test);
        if node.kind() != NodeKind::Test {
            return Err(ScopeError::structural(title, "only tests can be run"));
        }
        let effective = resolve(tree, test)?;
        if let GateDecision::Skip { requested } = should_run(&effective, &self.browser) {
            info!(
                test = %title,
                requested = %requested,
                browser = %self.browser.name,
                family = %self.browser.family,
                "test excluded by browser selection"
            );
            return Ok(TestOutcome::Skipped { requested });
        }
        let view = effective.layered_over(self.baseline.as_map(), tree.schema());
        let failure = self.within_window(&title, view, |handle| {
            let cx = TestContext::new(tree, test, Some(test), handle, &self.browser);
            run_bracketed(tree, node, &cx)
        })?;
        Ok(failure.map_or(TestOutcome::Passed, TestOutcome::Failed))
    }

    /// Run the `kind` hooks of `suite` inside the suite's own window.
    ///
    /// Returns the first failure, if any; later hooks of the same kind are
    /// not run after a failure.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ScopeController::run_test`], with the roles of
    /// suites and tests swapped.
    pub fn run_suite_hooks(
        &self,
        tree: &ScopeTree,
        suite: NodeId,
        kind: HookKind,
        current_test: Option<NodeId>,
    ) -> ScopeResult<Option<BodyFailure>> {
        let node = tree.get(suite)?;
        let hooks = node.hooks().of(kind);
        if hooks.is_empty() {
            return Ok(None);
        }
        let title = tree.full_title(suite);
        if node.kind() != NodeKind::Suite {
            return Err(ScopeError::structural(title, "only suites carry hooks"));
        }
        let view = resolve(tree, suite)?.layered_over(self.baseline.as_map(), tree.schema());
        self.within_window(&title, view, |handle| {
            let cx = TestContext::new(tree, suite, current_test, handle, &self.browser);
            hooks
                .iter()
                .find_map(|hook| invoke(kind.phase(), hook, &cx).err())
        })
    }

    fn within_window<F>(
        &self,
        title: &str,
        view: Snapshot,
        run: F,
    ) -> ScopeResult<Option<BodyFailure>>
    where
        F: FnOnce(&ConfigHandle) -> Option<BodyFailure>,
    {
        let previous = self.cell.snapshot();
        let guard = self.cell.activate(title, view)?;
        let handle = self.cell.handle();
        let failure = run(&handle);
        guard.release()?;
        if self.cell.snapshot() != previous {
            error!(window = %title, "configuration differs from its pre-window snapshot");
            return Err(ScopeError::leak(
                title,
                "configuration differs from its pre-window snapshot",
            ));
        }
        if let Some(reported) = &failure {
            debug!(window = %title, failure = %reported, "window closed after failure");
        }
        Ok(failure)
    }
}

/// Run ancestor `before_each` hooks (outermost first), the body, then
/// ancestor `after_each` hooks (innermost first). A failing `before_each`
/// skips the body; `after_each` hooks always run. The first failure wins.
fn run_bracketed(tree: &ScopeTree, test: &ScopeNode, cx: &TestContext<'_>) -> Option<BodyFailure> {
    let mut suites: Vec<&ScopeNode> = tree.ancestors(test.id()).collect();
    suites.reverse();

    let mut failure = suites
        .iter()
        .flat_map(|suite| suite.hooks().of(HookKind::BeforeEach))
        .find_map(|hook| invoke(Phase::BeforeEach, hook, cx).err());

    if failure.is_none() {
        failure = test
            .body()
            .and_then(|body| invoke(Phase::Body, body, cx).err());
    }

    for hook in suites
        .iter()
        .rev()
        .flat_map(|suite| suite.hooks().of(HookKind::AfterEach))
    {
        if let Err(err) = invoke(Phase::AfterEach, hook, cx) {
            failure.get_or_insert(err);
        }
    }
    failure
}

fn invoke(phase: Phase, callback: &Callback, cx: &TestContext<'_>) -> Result<(), BodyFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(cx))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(BodyFailure::Error { phase, source }),
        Err(payload) => Err(BodyFailure::Panic {
            phase,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
