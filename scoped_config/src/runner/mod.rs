//! Sequential runner driving the controller over a whole scope tree.

use tracing::info;

use crate::controller::{ScopeController, TestOutcome};
use crate::error::{BodyFailure, BoxError, Phase, ScopeResult};
use crate::gate::GateDecision;
use crate::tree::{HookKind, NodeId, NodeKind, ScopeTree};

/// Result recorded for one test.
#[derive(Debug)]
pub struct TestReport {
    /// Test node.
    pub id: NodeId,
    /// Full title from the root.
    pub title: String,
    /// What happened.
    pub outcome: TestOutcome,
}

/// Failure of a suite-level hook.
#[derive(Debug)]
pub struct HookFailure {
    /// Suite owning the hook.
    pub suite: NodeId,
    /// Full title of the suite.
    pub title: String,
    /// The failure itself.
    pub failure: BodyFailure,
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    results: Vec<TestReport>,
    hook_failures: Vec<HookFailure>,
}

impl RunReport {
    /// Per-test results in execution order.
    #[must_use]
    pub fn results(&self) -> &[TestReport] {
        &self.results
    }

    /// Suite-level hook failures in the order they occurred.
    #[must_use]
    pub fn hook_failures(&self) -> &[HookFailure] {
        &self.hook_failures
    }

    /// Outcome recorded for the test titled `title`.
    #[must_use]
    pub fn outcome_of(&self, title: &str) -> Option<&TestOutcome> {
        self.results
            .iter()
            .find(|report| report.title == title)
            .map(|report| &report.outcome)
    }

    /// Number of passed tests.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(TestOutcome::is_passed)
    }

    /// Number of failed tests.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(TestOutcome::is_failed)
    }

    /// Number of tests excluded by the browser gate.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(TestOutcome::is_skipped)
    }

    /// Number of tests excluded by exclusive focus.
    #[must_use]
    pub fn filtered(&self) -> usize {
        self.count(|outcome| matches!(outcome, TestOutcome::Filtered))
    }

    /// Whether no test and no suite hook failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.hook_failures.is_empty()
    }

    fn count(&self, pred: impl Fn(&TestOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    fn record(&mut self, tree: &ScopeTree, id: NodeId, outcome: TestOutcome) {
        self.results.push(TestReport {
            id,
            title: tree.full_title(id),
            outcome,
        });
    }
}

/// Walks a tree depth-first in declaration order, one test at a time.
///
/// When any node carries the only marker, tests outside focused subtrees
/// are reported as [`TestOutcome::Filtered`]. Suites where no test is both
/// selected and accepted by the browser gate never open a window, so their
/// suite-level hooks do not run.
///
/// # Examples
///
/// ```
/// use scoped_config::{
///     Baseline, ConfigSchema, Declaration, Runner, RuntimeBrowser, ScopeController, ScopeTree,
/// };
/// use serde_json::json;
///
/// let tree = ScopeTree::build(
///     ConfigSchema::default(),
///     Declaration::suite("per-test config")
///         .child(
///             Declaration::test("chrome only", |_| Ok(()))
///                 .with_overlay(json!({"browser": "chrome"})),
///         )
///         .child(Declaration::test("anywhere", |_| Ok(()))),
/// )?;
/// let runner = Runner::new(ScopeController::new(
///     Baseline::empty(),
///     RuntimeBrowser::new("firefox", "firefox"),
/// ));
/// let report = runner.run(&tree)?;
/// assert_eq!((report.passed(), report.skipped()), (1, 1));
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[derive(Debug)]
pub struct Runner {
    controller: ScopeController,
}

impl Runner {
    /// Create a runner around `controller`.
    #[must_use]
    pub const fn new(controller: ScopeController) -> Self {
        Self { controller }
    }

    /// Controller used for every window.
    #[must_use]
    pub const fn controller(&self) -> &ScopeController {
        &self.controller
    }

    /// Run every selected test of `tree`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, such as a detected leak; body and
    /// hook failures are recorded on the report instead.
    pub fn run(&self, tree: &ScopeTree) -> ScopeResult<RunReport> {
        let mut report = RunReport::default();
        let focus = tree.has_exclusive();
        let root = tree.root();
        match tree.get(root)?.kind() {
            NodeKind::Suite => {
                self.run_suite(tree, root, focus, &mut report)?;
            }
            NodeKind::Test => {
                let outcome = self.run_one(tree, root, focus)?;
                report.record(tree, root, outcome);
            }
        }
        info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            filtered = report.filtered(),
            "run finished"
        );
        Ok(report)
    }

    fn run_suite(
        &self,
        tree: &ScopeTree,
        suite: NodeId,
        focus: bool,
        report: &mut RunReport,
    ) -> ScopeResult<Option<NodeId>> {
        let mut plan = Vec::new();
        for test in tree.tests_under(suite) {
            plan.push((test, self.exclusion(tree, test, focus)?));
        }
        if plan.iter().all(|(_, excluded)| excluded.is_some()) {
            info!(suite = %tree.full_title(suite), "no runnable test, suite hooks not run");
            for (test, excluded) in plan {
                if let Some(outcome) = excluded {
                    report.record(tree, test, outcome);
                }
            }
            return Ok(None);
        }

        if let Some(failure) = self
            .controller
            .run_suite_hooks(tree, suite, HookKind::BeforeAll, None)?
        {
            let title = tree.full_title(suite);
            for (test, excluded) in plan {
                report.record(tree, test, excluded.unwrap_or_else(|| blocked(&title)));
            }
            report.hook_failures.push(HookFailure {
                suite,
                title,
                failure,
            });
            return Ok(None);
        }

        let mut last_test = None;
        for child in tree.get(suite)?.children() {
            let ran = match tree.get(*child)?.kind() {
                NodeKind::Suite => self.run_suite(tree, *child, focus, report)?,
                NodeKind::Test => {
                    let outcome = self.run_one(tree, *child, focus)?;
                    let ran = !matches!(outcome, TestOutcome::Filtered);
                    report.record(tree, *child, outcome);
                    ran.then_some(*child)
                }
            };
            last_test = ran.or(last_test);
        }

        if let Some(failure) = self
            .controller
            .run_suite_hooks(tree, suite, HookKind::AfterAll, last_test)?
        {
            report.hook_failures.push(HookFailure {
                suite,
                title: tree.full_title(suite),
                failure,
            });
        }
        Ok(last_test)
    }

    /// Outcome of a test that will not open a window, or `None` when it runs.
    fn exclusion(
        &self,
        tree: &ScopeTree,
        test: NodeId,
        focus: bool,
    ) -> ScopeResult<Option<TestOutcome>> {
        if !selected(tree, test, focus) {
            return Ok(Some(TestOutcome::Filtered));
        }
        Ok(match self.controller.gate(tree, test)? {
            GateDecision::Run => None,
            GateDecision::Skip { requested } => Some(TestOutcome::Skipped { requested }),
        })
    }

    fn run_one(&self, tree: &ScopeTree, test: NodeId, focus: bool) -> ScopeResult<TestOutcome> {
        if !selected(tree, test, focus) {
            info!(test = %tree.full_title(test), "test filtered by exclusive focus");
            return Ok(TestOutcome::Filtered);
        }
        self.controller.run_test(tree, test)
    }
}

fn selected(tree: &ScopeTree, test: NodeId, focus: bool) -> bool {
    !focus || tree.is_focused(test)
}

fn blocked(suite: &str) -> TestOutcome {
    let source: BoxError = format!("before all hook of '{suite}' failed").into();
    TestOutcome::Failed(BodyFailure::Error {
        phase: Phase::BeforeAll,
        source,
    })
}

#[cfg(test)]
mod tests;
