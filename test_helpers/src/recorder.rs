//! Recorder capturing the configuration each body observed.
//!
//! Bodies run inside the engine's activation windows, so the snapshots here
//! show exactly what a test could see. The recorder is cheap to clone and
//! shares its log between clones.

use std::sync::Arc;

use parking_lot::Mutex;
use scoped_config::{BoxError, Snapshot, TestContext};

/// One body invocation and the configuration it observed.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// Full title of the test or suite whose window was active.
    pub title: String,
    /// Configuration visible at the time.
    pub config: Snapshot,
}

/// Shared log of observations.
///
/// # Examples
///
/// ```
/// use scoped_config::{Baseline, ConfigSchema, Declaration, Runner, ScopeController, ScopeTree};
/// use serde_json::json;
/// use scoped_config_test_helpers::{browsers, recorder::Recorder};
///
/// let recorder = Recorder::new();
/// let tree = ScopeTree::build(
///     ConfigSchema::default(),
///     Declaration::suite("root")
///         .child(Declaration::test("t", recorder.body()).with_overlay(json!({"foo": true}))),
/// )?;
/// let runner = Runner::new(ScopeController::new(Baseline::empty(), browsers::chrome()));
/// runner.run(&tree)?;
/// let seen = recorder.observed("root > t").and_then(|c| c.get("foo").cloned());
/// assert_eq!(seen, Some(json!(true)));
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<Observation>>>,
}

impl Recorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the configuration visible to `cx`.
    pub fn record(&self, cx: &TestContext<'_>) {
        self.entries.lock().push(Observation {
            title: cx.full_title(),
            config: cx.config().config(),
        });
    }

    /// Body or hook that records and succeeds.
    #[must_use]
    pub fn body(
        &self,
    ) -> impl Fn(&TestContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static {
        let recorder = self.clone();
        move |cx| {
            recorder.record(cx);
            Ok(())
        }
    }

    /// Most recent configuration observed under `title`.
    #[must_use]
    pub fn observed(&self, title: &str) -> Option<Snapshot> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|entry| entry.title == title)
            .map(|entry| entry.config.clone())
    }

    /// Titles in the order they were recorded.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.title.clone())
            .collect()
    }

    /// Every observation so far.
    #[must_use]
    pub fn observations(&self) -> Vec<Observation> {
        self.entries.lock().clone()
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
