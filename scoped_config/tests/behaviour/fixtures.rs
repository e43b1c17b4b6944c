//! Shared fixtures for the nested-suite scenarios.

use std::collections::BTreeMap;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use scoped_config::{ConfigHandle, NodeId, RunReport, ScopeTree, ScopeTreeBuilder};
use test_helpers::recorder::Recorder;

/// Scenario state carrying the tree under construction and the run results.
#[derive(Default, ScenarioState)]
pub struct TreeContext {
    pub builder: Slot<ScopeTreeBuilder>,
    pub nodes: Slot<BTreeMap<String, NodeId>>,
    pub tree: Slot<Arc<ScopeTree>>,
    pub report: Slot<Arc<RunReport>>,
    pub config: Slot<ConfigHandle>,
    pub recorder: Slot<Recorder>,
}

/// Creates a clean context with an empty recorder.
#[fixture]
pub fn tree_context() -> TreeContext {
    let context = TreeContext::default();
    context.recorder.set(Recorder::new());
    context
}
