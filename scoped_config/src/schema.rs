//! Registry of merge semantics for configuration keys.
//!
//! Every key replaces its inherited value unless the schema designates it as
//! a mergeable map. Mergeable maps (the `env` bucket being the motivating
//! case) are merged entry by entry across scope levels instead. The registry
//! is fixed when a [`crate::ScopeTree`] is built and is never inferred from
//! the shape of runtime values.

use std::collections::BTreeSet;

/// Key holding environment variables exposed to test bodies.
pub const ENV_KEY: &str = "env";

/// Key restricting a scope to matching runtime browsers.
pub const BROWSER_KEY: &str = "browser";

/// How values for a key combine when a nested overlay sets it again.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeStrategy {
    /// The nearest overlay's value replaces the inherited one.
    Replace,
    /// Entries are merged one level deep; the nearest overlay wins per entry.
    MergeMap,
}

/// Closed set of keys that use [`MergeStrategy::MergeMap`].
///
/// # Examples
///
/// ```
/// use scoped_config::{ConfigSchema, MergeStrategy};
///
/// let schema = ConfigSchema::default().with_merge_map("reporterOptions");
/// assert_eq!(schema.strategy("env"), MergeStrategy::MergeMap);
/// assert_eq!(schema.strategy("reporterOptions"), MergeStrategy::MergeMap);
/// assert_eq!(schema.strategy("viewportWidth"), MergeStrategy::Replace);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSchema {
    merge_maps: BTreeSet<String>,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self::replace_only().with_merge_map(ENV_KEY)
    }
}

impl ConfigSchema {
    /// Schema in which every key replaces its inherited value.
    #[must_use]
    pub const fn replace_only() -> Self {
        Self {
            merge_maps: BTreeSet::new(),
        }
    }

    /// Designate `key` as a mergeable map.
    #[must_use]
    pub fn with_merge_map(mut self, key: impl Into<String>) -> Self {
        self.merge_maps.insert(key.into());
        self
    }

    /// Merge strategy registered for `key`.
    #[must_use]
    pub fn strategy(&self, key: &str) -> MergeStrategy {
        if self.merge_maps.contains(key) {
            MergeStrategy::MergeMap
        } else {
            MergeStrategy::Replace
        }
    }

    /// Iterate over the keys designated as mergeable maps.
    pub fn merge_map_keys(&self) -> impl Iterator<Item = &str> {
        self.merge_maps.iter().map(String::as_str)
    }
}
