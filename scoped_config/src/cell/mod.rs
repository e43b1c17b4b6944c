//! Single-owner cell holding the globally observable configuration.
//!
//! The cell starts out holding the baseline. [`ConfigCell::activate`] swaps
//! in a test's view and returns an [`ActivationGuard`]; the previous value
//! comes back when the guard is released or dropped, so unwinding out of a
//! test body cannot leave the view behind. Only one activation window may be
//! open at a time. Readers use cheap [`ConfigHandle`] clones.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{ScopeError, ScopeResult};
use crate::schema::ENV_KEY;

/// Full configuration mapping held by the cell.
pub type Snapshot = Map<String, Value>;

#[derive(Debug)]
struct OpenWindow {
    generation: u64,
    label: String,
}

#[derive(Debug)]
struct CellState {
    current: Snapshot,
    generation: u64,
    open: Option<OpenWindow>,
}

/// Owner of the globally observable configuration.
///
/// # Examples
///
/// ```
/// use scoped_config::ConfigCell;
/// use serde_json::{Map, json};
///
/// let cell = ConfigCell::new(Map::new());
/// let handle = cell.handle();
/// let mut view = Map::new();
/// view.insert("viewportWidth".into(), json!(400));
/// let guard = cell.activate("can set viewport", view)?;
/// assert_eq!(handle.get("viewportWidth"), Some(json!(400)));
/// guard.release()?;
/// assert_eq!(handle.get("viewportWidth"), None);
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
#[derive(Debug)]
pub struct ConfigCell {
    state: Arc<RwLock<CellState>>,
}

impl ConfigCell {
    /// Create a cell holding `baseline`.
    #[must_use]
    pub fn new(baseline: Snapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(CellState {
                current: baseline,
                generation: 0,
                open: None,
            })),
        }
    }

    /// Read handle sharing this cell.
    #[must_use]
    pub fn handle(&self) -> ConfigHandle {
        ConfigHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Copy of the value currently held.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().current.clone()
    }

    /// Whether an activation window is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.read().open.is_some()
    }

    /// Replace the held value with `view` until the returned guard is
    /// released or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::LeakDetected`] when another window is still
    /// open; windows never overlap.
    pub fn activate(
        &self,
        label: impl Into<String>,
        view: Snapshot,
    ) -> ScopeResult<ActivationGuard<'_>> {
        let window: String = label.into();
        let mut state = self.state.write();
        if let Some(open) = &state.open {
            return Err(ScopeError::leak(
                window,
                format!("activation window for '{}' is still open", open.label),
            ));
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let previous = std::mem::replace(&mut state.current, view);
        state.open = Some(OpenWindow {
            generation,
            label: window.clone(),
        });
        debug!(window = %window, generation, "configuration activated");
        Ok(ActivationGuard {
            cell: self,
            previous: Some(previous),
            generation,
            label: window,
        })
    }
}

/// RAII guard restoring the cell's previous value on release or drop.
#[must_use = "dropping restores the prior configuration"]
#[derive(Debug)]
pub struct ActivationGuard<'a> {
    cell: &'a ConfigCell,
    previous: Option<Snapshot>,
    generation: u64,
    label: String,
}

impl ActivationGuard<'_> {
    /// Explicitly restore the previous value.
    ///
    /// Prefer this over relying on [`Drop`] so that an inconsistent window
    /// surfaces as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::LeakDetected`] when the cell's open window is
    /// not the one this guard opened. The previous value is restored even
    /// then.
    pub fn release(mut self) -> ScopeResult<()> {
        self.restore()
            .map_err(|detail| ScopeError::leak(self.label.clone(), detail))
    }

    /// Label of the window this guard holds open.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn restore(&mut self) -> Result<(), String> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        let mut state = self.cell.state.write();
        let open = state.open.take();
        state.current = previous;
        debug!(window = %self.label, generation = self.generation, "configuration restored");
        match open {
            Some(window) if window.generation == self.generation => Ok(()),
            Some(window) => Err(format!(
                "window '{}' was open when '{}' closed",
                window.label, self.label
            )),
            None => Err(format!("window '{}' was already closed", self.label)),
        }
    }
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        if let Err(detail) = self.restore() {
            error!(window = %self.label, %detail, "inconsistent activation window");
        }
    }
}

/// Shared read access to the configuration cell.
///
/// Bodies and hooks query the active view through a handle; outside any
/// window the handle observes the baseline.
#[derive(Clone, Debug)]
pub struct ConfigHandle {
    state: Arc<RwLock<CellState>>,
}

impl ConfigHandle {
    /// The entire configuration currently observable.
    #[must_use]
    pub fn config(&self) -> Snapshot {
        self.state.read().current.clone()
    }

    /// A single configuration value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.read().current.get(key).cloned()
    }

    /// A whole named bucket, if the key holds an object.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<Map<String, Value>> {
        self.state
            .read()
            .current
            .get(name)
            .and_then(Value::as_object)
            .cloned()
    }

    /// One entry of a named bucket.
    #[must_use]
    pub fn bucket_entry(&self, name: &str, key: &str) -> Option<Value> {
        self.state
            .read()
            .current
            .get(name)
            .and_then(Value::as_object)
            .and_then(|bucket| bucket.get(key))
            .cloned()
    }

    /// The environment-variable bucket; empty when none is configured.
    #[must_use]
    pub fn env(&self) -> Map<String, Value> {
        self.bucket(ENV_KEY).unwrap_or_default()
    }

    /// One environment variable.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<Value> {
        self.bucket_entry(ENV_KEY, key)
    }

    /// Whether an activation window is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.read().open.is_some()
    }

    pub(crate) fn set(&self, key: &str, value: Value) {
        self.state.write().current.insert(key.to_owned(), value);
    }

    pub(crate) fn set_bucket_entry(&self, name: &str, key: &str, value: Value) {
        let mut state = self.state.write();
        let slot = state
            .current
            .entry(name.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Some(bucket) = slot.as_object_mut() {
            bucket.insert(key.to_owned(), value);
        }
    }
}
