//! Process baseline configuration observed outside any activation window.
//!
//! The baseline is composed with Figment: serialised defaults first, then
//! process environment variables carrying the configured prefix override
//! plain keys. Variables carrying the env-bucket prefix populate the `env`
//! bucket instead. Keys keep the case they were written with.

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cell::Snapshot;
use crate::error::{ScopeError, ScopeResult};
use crate::schema::ENV_KEY;

/// Default prefix for variables overriding plain configuration keys.
pub const DEFAULT_CONFIG_PREFIX: &str = "SCOPED_CONFIG_";

/// Default prefix for variables feeding the `env` bucket.
pub const DEFAULT_ENV_PREFIX: &str = "SCOPED_ENV_";

/// Which process environment variables contribute to the baseline.
///
/// The two prefixes should not nest, otherwise a variable would feed both
/// layers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaselineSources {
    config_prefix: Option<String>,
    env_prefix: Option<String>,
}

impl Default for BaselineSources {
    fn default() -> Self {
        Self {
            config_prefix: Some(DEFAULT_CONFIG_PREFIX.to_owned()),
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_owned()),
        }
    }
}

impl BaselineSources {
    /// Read nothing from the process environment.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            config_prefix: None,
            env_prefix: None,
        }
    }

    /// Override plain keys from variables starting with `prefix`.
    #[must_use]
    pub fn config_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config_prefix = Some(prefix.into());
        self
    }

    /// Populate the `env` bucket from variables starting with `prefix`.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }
}

/// Configuration active before any test runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Baseline(Snapshot);

impl Baseline {
    /// A baseline that declares nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a baseline from an in-memory JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Baseline`] when `value` is not an object.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_config::Baseline;
    /// use serde_json::json;
    ///
    /// let baseline = Baseline::from_value(&json!({"defaultCommandTimeout": 4000}))?;
    /// assert_eq!(baseline.get("defaultCommandTimeout"), Some(&json!(4000)));
    /// assert!(Baseline::from_value(&json!("nope")).is_err());
    /// # Ok::<_, scoped_config::ScopeError>(())
    /// ```
    pub fn from_value(value: &Value) -> ScopeResult<Self> {
        Self::load(value, &BaselineSources::none())
    }

    /// Compose `defaults` with the process environment described by
    /// `sources`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Baseline`] when `defaults` does not serialise
    /// to a mapping or the merged layers cannot be extracted.
    pub fn load<T: Serialize>(defaults: &T, sources: &BaselineSources) -> ScopeResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(defaults));
        if let Some(prefix) = &sources.config_prefix {
            figment = figment.merge(Env::prefixed(prefix).lowercase(false));
        }
        let mut map: Map<String, Value> = figment.extract().map_err(ScopeError::baseline)?;
        if let Some(prefix) = &sources.env_prefix {
            let vars = env_bucket(prefix);
            if !vars.is_empty() {
                let slot = map
                    .entry(ENV_KEY.to_owned())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Some(bucket) = slot.as_object_mut() {
                    bucket.extend(vars);
                }
            }
        }
        debug!(keys = map.len(), "baseline configuration composed");
        Ok(Self(map))
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the baseline mapping.
    #[must_use]
    pub const fn as_map(&self) -> &Snapshot {
        &self.0
    }

    /// Consume the baseline, returning its mapping.
    #[must_use]
    pub fn into_map(self) -> Snapshot {
        self.0
    }
}

fn env_bucket(prefix: &str) -> Map<String, Value> {
    Env::prefixed(prefix)
        .lowercase(false)
        .iter()
        .map(|(key, value)| (key.as_str().to_owned(), Value::String(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow};
    use serde_json::json;

    use super::{Baseline, BaselineSources};

    #[test]
    fn environment_overrides_defaults_and_fills_env_bucket() -> Result<()> {
        let mut loaded = None;
        figment::Jail::try_with(|jail| {
            jail.clear_env();
            jail.set_env("SCOPED_CONFIG_defaultCommandTimeout", "200");
            jail.set_env("SCOPED_ENV_FOO_VALUE", "foo");
            loaded = Some(Baseline::load(
                &json!({"defaultCommandTimeout": 4000, "viewportWidth": 1000}),
                &BaselineSources::default(),
            )?);
            Ok(())
        })
        .map_err(|err| anyhow!(err.to_string()))?;
        let baseline = loaded.ok_or_else(|| anyhow!("jail did not run"))?;
        assert_eq!(baseline.get("defaultCommandTimeout"), Some(&json!(200)));
        assert_eq!(baseline.get("viewportWidth"), Some(&json!(1000)));
        assert_eq!(baseline.get("env"), Some(&json!({"FOO_VALUE": "foo"})));
        Ok(())
    }

    #[test]
    fn env_bucket_merges_with_declared_entries() -> Result<()> {
        let mut loaded = None;
        figment::Jail::try_with(|jail| {
            jail.clear_env();
            jail.set_env("APP_ENV_BAR", "from-process");
            loaded = Some(Baseline::load(
                &json!({"env": {"FOO": "declared", "BAR": "declared"}}),
                &BaselineSources::none().env_prefix("APP_ENV_"),
            )?);
            Ok(())
        })
        .map_err(|err| anyhow!(err.to_string()))?;
        let baseline = loaded.ok_or_else(|| anyhow!("jail did not run"))?;
        assert_eq!(
            baseline.get("env"),
            Some(&json!({"FOO": "declared", "BAR": "from-process"}))
        );
        Ok(())
    }

    #[test]
    fn non_object_defaults_are_rejected() {
        assert!(Baseline::from_value(&json!([1, 2, 3])).is_err());
    }
}
