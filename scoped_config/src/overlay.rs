//! Validated configuration overlays attached to scope nodes.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{ConfigSchema, MergeStrategy};

/// Reasons a declared overlay is rejected.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum OverlayError {
    /// The overlay itself is not a mapping.
    #[error("overlay must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was supplied instead.
        found: &'static str,
    },

    /// A mergeable-map key was given a non-mapping value.
    #[error("'{key}' merges entry by entry and must be a JSON object, found {found}")]
    MapKeyNotAnObject {
        /// Offending key.
        key: String,
        /// JSON type that was supplied instead.
        found: &'static str,
    },
}

/// Configuration mapping declared directly on one scope node.
///
/// Overlays are immutable once constructed. A node without an overlay holds
/// [`Overlay::empty`]; an explicit `null` is rejected like any other
/// non-object value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Overlay(Map<String, Value>);

impl Overlay {
    /// An overlay that declares nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate `value` against `schema` and wrap it as an overlay.
    ///
    /// # Errors
    ///
    /// Returns an [`OverlayError`] when `value` is not an object, or when a
    /// key registered as a mergeable map holds something other than an
    /// object.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_config::{ConfigSchema, Overlay};
    /// use serde_json::json;
    ///
    /// let schema = ConfigSchema::default();
    /// assert!(Overlay::from_value(json!({"env": {"FOO": "a"}}), &schema).is_ok());
    /// assert!(Overlay::from_value(json!({"env": "FOO=a"}), &schema).is_err());
    /// assert!(Overlay::from_value(json!([1, 2]), &schema).is_err());
    /// assert!(Overlay::from_value(json!(null), &schema).is_err());
    /// ```
    pub fn from_value(value: Value, schema: &ConfigSchema) -> Result<Self, OverlayError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(OverlayError::NotAnObject {
                    found: json_type(&other),
                });
            }
        };
        for (key, entry) in &map {
            if schema.strategy(key) == MergeStrategy::MergeMap && !entry.is_object() {
                return Err(OverlayError::MapKeyNotAnObject {
                    key: key.clone(),
                    found: json_type(entry),
                });
            }
        }
        Ok(Self(map))
    }

    /// Value declared for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the overlay declares no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys declared.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over declared keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

pub(crate) const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
