//! Effective configuration computed from the root-to-node overlay chain.
//!
//! Overlays are folded root first, so the nearest declaration of a plain key
//! wins while keys declared only by an ancestor stay visible. Keys the
//! schema designates as mergeable maps are merged one entry at a time, with
//! the nearest overlay winning per entry. Each walk follows only the node's
//! own ancestor chain, so sibling subtrees never see each other's overlays.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ScopeResult;
use crate::schema::{ConfigSchema, MergeStrategy};
use crate::tree::{NodeId, ScopeTree};

/// Merged configuration for one node.
///
/// Only keys declared somewhere on the node's chain are present; anything
/// else falls back to the baseline once the configuration is activated.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveConfig(Map<String, Value>);

impl EffectiveConfig {
    /// Value for `key`, if any overlay on the chain declared it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether any overlay on the chain declared `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Mapping stored under `name`, if it is an object.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    /// Iterate over the merged keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of merged keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no overlay on the chain declared anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the merged mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the configuration, returning the merged mapping.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Apply this configuration over `baseline` using the schema's merge
    /// rules, producing the full view a test observes.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_config::{ConfigSchema, Declaration, ScopeTree, resolve};
    /// use serde_json::json;
    ///
    /// let tree = ScopeTree::build(
    ///     ConfigSchema::default(),
    ///     Declaration::suite("root").with_overlay(json!({"env": {"FOO": "c"}})),
    /// )?;
    /// let effective = resolve(&tree, tree.root())?;
    /// let baseline = json!({"env": {"FOO": "a", "BAR": "b"}, "viewportWidth": 1000});
    /// let view = effective.layered_over(baseline.as_object().unwrap(), tree.schema());
    /// assert_eq!(view["env"], json!({"FOO": "c", "BAR": "b"}));
    /// assert_eq!(view["viewportWidth"], json!(1000));
    /// # Ok::<_, scoped_config::ScopeError>(())
    /// ```
    #[must_use]
    pub fn layered_over(
        &self,
        baseline: &Map<String, Value>,
        schema: &ConfigSchema,
    ) -> Map<String, Value> {
        let mut view = baseline.clone();
        apply_overlay(&mut view, &self.0, schema);
        view
    }
}

/// Compute the effective configuration of `node`.
///
/// Suites resolve as if they were a test with no further descendants.
///
/// # Errors
///
/// Returns [`crate::ScopeError::UnknownNode`] when `node` does not belong to
/// `tree`.
///
/// # Examples
///
/// ```
/// use scoped_config::{ConfigSchema, Declaration, ScopeTree, resolve};
/// use serde_json::json;
///
/// let tree = ScopeTree::build(
///     ConfigSchema::default(),
///     Declaration::suite("a")
///         .with_overlay(json!({"x": 1}))
///         .child(Declaration::suite("b")),
/// )?;
/// let b = tree.get(tree.root())?.children()[0];
/// assert_eq!(resolve(&tree, b)?.get("x"), Some(&json!(1)));
/// # Ok::<_, scoped_config::ScopeError>(())
/// ```
pub fn resolve(tree: &ScopeTree, node: NodeId) -> ScopeResult<EffectiveConfig> {
    let chain = tree.path_from_root(node)?;
    let mut merged = Map::new();
    for scope in &chain {
        apply_overlay(&mut merged, scope.overlay().as_map(), tree.schema());
    }
    debug!(
        node = %node,
        depth = chain.len(),
        keys = merged.len(),
        "resolved effective configuration"
    );
    Ok(EffectiveConfig(merged))
}

/// Overlay `layer` onto `target` in place.
///
/// Behaviour:
/// - Plain keys replace the accumulated value wholesale, whatever its shape.
/// - Mergeable-map keys are merged one level deep: each incoming entry
///   replaces the accumulated entry of the same name, other entries survive.
/// - A non-object accumulated value under a mergeable-map key is discarded
///   before merging.
pub(crate) fn apply_overlay(
    target: &mut Map<String, Value>,
    layer: &Map<String, Value>,
    schema: &ConfigSchema,
) {
    for (key, value) in layer {
        match (schema.strategy(key), value) {
            (MergeStrategy::MergeMap, Value::Object(entries)) => {
                merge_entries(target, key, entries);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_entries(target: &mut Map<String, Value>, key: &str, entries: &Map<String, Value>) {
    let slot = target
        .entry(key.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let Some(existing) = slot.as_object_mut() else {
        return;
    };
    for (name, value) in entries {
        existing.insert(name.clone(), value.clone());
    }
}
