//! Browser gate deciding whether a test runs under the current browser.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::resolve::EffectiveConfig;
use crate::schema::BROWSER_KEY;

/// Identity of the browser currently executing tests.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct RuntimeBrowser {
    /// Exact browser name, for example `chrome` or `firefox`.
    pub name: String,
    /// Coarser grouping, for example `chromium` or `firefox`.
    pub family: String,
}

impl RuntimeBrowser {
    /// Describe a runtime browser.
    #[must_use]
    pub fn new(name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
        }
    }

    /// Whether `wanted` equals this browser's name or its family.
    #[must_use]
    pub fn matches(&self, wanted: &str) -> bool {
        self.name == wanted || self.family == wanted
    }
}

/// Outcome of consulting the gate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GateDecision {
    /// The test proceeds.
    Run,
    /// The test is excluded; this is not a failure.
    Skip {
        /// Browser selection that did not match, as declared.
        requested: String,
    },
}

impl GateDecision {
    /// Whether the decision lets the test run.
    #[must_use]
    pub const fn is_run(&self) -> bool {
        matches!(self, Self::Run)
    }
}

/// Decide whether a test with `effective` configuration runs under
/// `browser`.
///
/// A string `browser` value accepts an exact name or family match. A list
/// of strings accepts a match on any element. Without a `browser` key the
/// test always runs; values of any other type, and lists without a single
/// string entry, are ignored with a warning.
///
/// # Examples
///
/// ```
/// use scoped_config::{ConfigSchema, Declaration, RuntimeBrowser, ScopeTree, resolve, should_run};
/// use serde_json::json;
///
/// let tree = ScopeTree::build(
///     ConfigSchema::default(),
///     Declaration::suite("firefox only").with_overlay(json!({"browser": "firefox"})),
/// )?;
/// let effective = resolve(&tree, tree.root())?;
/// assert!(should_run(&effective, &RuntimeBrowser::new("firefox", "firefox")).is_run());
/// assert!(!should_run(&effective, &RuntimeBrowser::new("chrome", "chromium")).is_run());
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[must_use]
pub fn should_run(effective: &EffectiveConfig, browser: &RuntimeBrowser) -> GateDecision {
    match effective.get(BROWSER_KEY) {
        None => GateDecision::Run,
        Some(Value::String(wanted)) => decide(browser.matches(wanted), wanted.clone()),
        Some(Value::Array(items)) => {
            let wanted: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if wanted.is_empty() {
                warn!(value = ?items, "browser list names no browser, running the test");
                return GateDecision::Run;
            }
            if wanted.len() != items.len() {
                warn!(value = ?items, "ignoring non-string browser entries");
            }
            let hit = wanted.iter().any(|w| browser.matches(w));
            decide(hit, wanted.join(", "))
        }
        Some(other) => {
            warn!(value = %other, "browser selection must be a string or a list of strings");
            GateDecision::Run
        }
    }
}

fn decide(hit: bool, requested: String) -> GateDecision {
    if hit {
        GateDecision::Run
    } else {
        GateDecision::Skip { requested }
    }
}
