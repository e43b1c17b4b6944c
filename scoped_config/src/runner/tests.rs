//! Unit tests for whole-tree runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::{RunReport, Runner};
use crate::{
    Baseline, ConfigSchema, Declaration, Phase, RuntimeBrowser, ScopeController, ScopeTree,
    TestOutcome,
};

fn runner(name: &str, family: &str) -> Runner {
    Runner::new(ScopeController::new(
        Baseline::empty(),
        RuntimeBrowser::new(name, family),
    ))
}

fn run(tree: &ScopeTree, name: &str, family: &str) -> RunReport {
    runner(name, family).run(tree).expect("run completes")
}

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&count), count)
}

#[test]
fn focus_filters_everything_outside_only_subtrees() {
    let (seen, bump) = counter();
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root")
            .child(
                Declaration::suite("focused")
                    .only()
                    .child(Declaration::test("runs", move |_| {
                        bump.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })),
            )
            .child(
                Declaration::suite("other")
                    .child(Declaration::test("filtered", |_| Ok(()))),
            ),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.filtered(), 1);
    assert!(matches!(
        report.outcome_of("root > other > filtered"),
        Some(TestOutcome::Filtered)
    ));
    assert!(report.is_success());
}

#[test]
fn failed_before_all_blocks_the_suite() {
    let (seen, bump) = counter();
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root")
            .child(
                Declaration::suite("broken")
                    .before_all(|_| Err("cannot start".into()))
                    .child(Declaration::test("never", move |_| {
                        bump.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })),
            )
            .child(Declaration::test("still runs", |_| Ok(()))),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.hook_failures().len(), 1);
    assert_eq!(report.hook_failures()[0].failure.phase(), Phase::BeforeAll);
    assert!(!report.is_success());
}

#[test]
fn failed_before_all_leaves_unfocused_tests_filtered() {
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root")
            .before_all(|_| Err("cannot start".into()))
            .child(Declaration::test("focused", |_| Ok(())).only())
            .child(Declaration::test("unfocused", |_| Ok(()))),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert_eq!(report.failed(), 1);
    assert_eq!(report.filtered(), 1);
    assert!(matches!(
        report.outcome_of("root > unfocused"),
        Some(TestOutcome::Filtered)
    ));
    assert_eq!(
        report
            .outcome_of("root > focused")
            .and_then(TestOutcome::failure)
            .map(|failure| failure.phase()),
        Some(Phase::BeforeAll)
    );
}

#[test]
fn failed_before_all_leaves_gated_tests_skipped() {
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root")
            .before_all(|_| Err("cannot start".into()))
            .child(Declaration::test("anywhere", |_| Ok(())))
            .child(
                Declaration::test("firefox only", |_| Ok(()))
                    .with_overlay(json!({"browser": "firefox"})),
            ),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 1);
}

#[test]
fn suite_hooks_stay_closed_when_the_gate_excludes_every_test() {
    let (seen, bump) = counter();
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root").child(
            Declaration::suite("firefox only")
                .with_overlay(json!({"browser": "firefox"}))
                .before_all(move |cx| {
                    bump.fetch_add(1, Ordering::SeqCst);
                    if cx.browser().family == "firefox" {
                        Ok(())
                    } else {
                        Err("suite opened under the wrong browser".into())
                    }
                })
                .child(Declaration::test("gated", |_| Ok(()))),
        ),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(report.skipped(), 1);
    assert!(report.hook_failures().is_empty());
    assert!(report.is_success());
}

#[test]
fn gated_suite_opens_under_a_matching_browser() {
    let (seen, bump) = counter();
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("firefox only")
            .with_overlay(json!({"browser": "firefox"}))
            .before_all(move |_| {
                bump.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .child(Declaration::test("gated", |_| Ok(()))),
    )
    .expect("tree builds");
    let report = run(&tree, "firefox", "firefox");
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(report.passed(), 1);
}

#[test]
fn after_all_sees_last_test_and_focus() {
    let (seen, bump) = counter();
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root")
            .after_all(move |cx| {
                let last = cx.current_test().map(|id| cx.tree().full_title(id));
                if last.as_deref() != Some("root > second") {
                    return Err(format!("unexpected current test {last:?}").into());
                }
                if cx.has_only() {
                    return Err("no focus declared".into());
                }
                bump.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .child(Declaration::test("first", |_| Ok(())))
            .child(Declaration::test("second", |_| Ok(()))),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert!(report.is_success(), "{:?}", report.hook_failures());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn failures_do_not_disturb_later_tests() {
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::suite("root")
            .child(
                Declaration::test("fails", |_| Err("boom".into()))
                    .with_overlay(json!({"defaultCommandTimeout": 200})),
            )
            .child(Declaration::test("clean", |cx| {
                if cx.config().get("defaultCommandTimeout").is_some() {
                    return Err("override leaked".into());
                }
                Ok(())
            })),
    )
    .expect("tree builds");
    let report = run(&tree, "chrome", "chromium");
    assert!(matches!(
        report.outcome_of("root > fails"),
        Some(TestOutcome::Failed(_))
    ));
    assert!(matches!(
        report.outcome_of("root > clean"),
        Some(TestOutcome::Passed)
    ));
}

#[test]
fn single_test_root_runs() {
    let tree = ScopeTree::build(
        ConfigSchema::default(),
        Declaration::test("lonely", |_| Ok(())),
    )
    .expect("tree builds");
    let report = run(&tree, "firefox", "firefox");
    assert_eq!(report.passed(), 1);
}
