//! Steps declaring trees, resolving overlays and running them.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, ensure};
use rstest_bdd_macros::{given, then, when};
use scoped_config::{
    Baseline, ConfigSchema, NodeId, Runner, ScopeController, ScopeResult, ScopeTree,
    ScopeTreeBuilder, resolve,
};
use serde_json::{Value, json};
use test_helpers::browsers;

use crate::fixtures::TreeContext;

fn parse(overlay: &str) -> Result<Value> {
    serde_json::from_str(overlay)
        .with_context(|| format!("invalid overlay {overlay}"))
}

fn baseline() -> Value {
    json!({ "defaultCommandTimeout": 4000 })
}

fn node(tree_context: &TreeContext, name: &str) -> Result<NodeId> {
    tree_context
        .nodes
        .get()
        .and_then(|nodes| nodes.get(name).copied())
        .ok_or_else(|| anyhow!("no node named {name}"))
}

fn remember(tree_context: &TreeContext, name: &str, id: NodeId) {
    let mut nodes = tree_context.nodes.take().unwrap_or_default();
    nodes.insert(name.to_owned(), id);
    tree_context.nodes.set(nodes);
}

fn with_builder<T>(
    tree_context: &TreeContext,
    declare: impl FnOnce(&mut ScopeTreeBuilder) -> ScopeResult<T>,
) -> Result<T> {
    let mut builder = tree_context
        .builder
        .take()
        .ok_or_else(|| anyhow!("no root suite declared"))?;
    let result = declare(&mut builder);
    tree_context.builder.set(builder);
    Ok(result?)
}

fn start(tree_context: &TreeContext, overlay: Option<Value>) -> Result<()> {
    ensure!(tree_context.builder.is_empty(), "root suite already declared");
    tree_context
        .builder
        .set(ScopeTreeBuilder::new(ConfigSchema::default()));
    let root = with_builder(tree_context, |builder| builder.add_root("root", overlay))?;
    remember(tree_context, "root", root);
    Ok(())
}

fn add_test(
    tree_context: &TreeContext,
    name: &str,
    parent: &str,
    overlay: Option<Value>,
) -> Result<()> {
    let parent_id = node(tree_context, parent)?;
    let body = tree_context
        .recorder
        .get()
        .ok_or_else(|| anyhow!("recorder missing"))?
        .body();
    let id = with_builder(tree_context, |builder| {
        builder.add_test(parent_id, name, overlay, body)
    })?;
    remember(tree_context, name, id);
    Ok(())
}

fn tree(tree_context: &TreeContext) -> Result<Arc<ScopeTree>> {
    if let Some(tree) = tree_context.tree.get() {
        return Ok(tree);
    }
    let builder = tree_context
        .builder
        .take()
        .ok_or_else(|| anyhow!("no root suite declared"))?;
    let tree = Arc::new(builder.finish()?);
    tree_context.tree.set(Arc::clone(&tree));
    Ok(tree)
}

#[given("a root suite")]
fn root_suite(tree_context: &TreeContext) -> Result<()> {
    start(tree_context, None)
}

#[given("a root suite with overlay {overlay}")]
fn root_suite_with_overlay(tree_context: &TreeContext, overlay: String) -> Result<()> {
    start(tree_context, Some(parse(&overlay)?))
}

#[given("a suite {name} under {parent} with overlay {overlay}")]
fn suite(tree_context: &TreeContext, name: String, parent: String, overlay: String) -> Result<()> {
    let parent_id = node(tree_context, &parent)?;
    let declared = parse(&overlay)?;
    let id = with_builder(tree_context, |builder| {
        builder.add_suite(parent_id, name.as_str(), Some(declared))
    })?;
    remember(tree_context, &name, id);
    Ok(())
}

#[given("a test {name} under {parent} with overlay {overlay}")]
fn test_with_overlay(
    tree_context: &TreeContext,
    name: String,
    parent: String,
    overlay: String,
) -> Result<()> {
    add_test(tree_context, &name, &parent, Some(parse(&overlay)?))
}

#[given("a plain test {name} under {parent}")]
fn plain_test(tree_context: &TreeContext, name: String, parent: String) -> Result<()> {
    add_test(tree_context, &name, &parent, None)
}

#[when("the tree is collected")]
fn collect(tree_context: &TreeContext) -> Result<()> {
    tree(tree_context).map(drop)
}

#[when("the tree runs under {browser}")]
fn run(tree_context: &TreeContext, browser: String) -> Result<()> {
    let tree = tree(tree_context)?;
    let controller = ScopeController::new(
        Baseline::from_value(&baseline())?,
        browsers::by_name(&browser)?,
    );
    tree_context.config.set(controller.config());
    let report = Runner::new(controller).run(&tree)?;
    tree_context.report.set(Arc::new(report));
    Ok(())
}

#[then("{name} resolves to {expected}")]
fn resolves_to(tree_context: &TreeContext, name: String, expected: String) -> Result<()> {
    let tree = tree(tree_context)?;
    let effective = resolve(&tree, node(tree_context, &name)?)?;
    let actual = Value::Object(effective.into_map());
    let wanted = parse(&expected)?;
    ensure!(
        actual == wanted,
        "{name} resolved to {actual}; expected {wanted}"
    );
    Ok(())
}

#[then("every test passes")]
fn every_test_passes(tree_context: &TreeContext) -> Result<()> {
    let report = tree_context
        .report
        .get()
        .ok_or_else(|| anyhow!("the tree has not run"))?;
    ensure!(report.is_success(), "run failed: {report:?}");
    ensure!(
        report.passed() == report.results().len(),
        "not every test ran: {report:?}"
    );
    Ok(())
}

#[then("{name} observed {key} as {value}")]
fn observed(tree_context: &TreeContext, name: String, key: String, value: String) -> Result<()> {
    let tree = tree(tree_context)?;
    let title = tree.full_title(node(tree_context, &name)?);
    let recorder = tree_context
        .recorder
        .get()
        .ok_or_else(|| anyhow!("recorder missing"))?;
    let seen = recorder
        .observed(&title)
        .ok_or_else(|| anyhow!("{title} did not run"))?;
    let expected = parse(&value)?;
    ensure!(
        seen.get(&key) == Some(&expected),
        "{title} observed {key} as {:?}; expected {expected}",
        seen.get(&key)
    );
    Ok(())
}

#[then("{passed} test passes and {skipped} test is skipped")]
fn counts(tree_context: &TreeContext, passed: String, skipped: String) -> Result<()> {
    let report = tree_context
        .report
        .get()
        .ok_or_else(|| anyhow!("the tree has not run"))?;
    let want_passed: usize = passed.parse()?;
    let want_skipped: usize = skipped.parse()?;
    ensure!(
        report.passed() == want_passed,
        "passed {}; expected {want_passed}",
        report.passed()
    );
    ensure!(
        report.skipped() == want_skipped,
        "skipped {}; expected {want_skipped}",
        report.skipped()
    );
    Ok(())
}

#[then("the configuration is back to its baseline")]
fn back_to_baseline(tree_context: &TreeContext) -> Result<()> {
    let handle = tree_context
        .config
        .get()
        .ok_or_else(|| anyhow!("the tree has not run"))?;
    ensure!(!handle.is_active(), "an activation window is still open");
    ensure!(
        Value::Object(handle.config()) == baseline(),
        "configuration is {:?}",
        handle.config()
    );
    Ok(())
}
