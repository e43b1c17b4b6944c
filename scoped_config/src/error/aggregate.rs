//! Aggregation container and iteration support for multiple `ScopeError` values.

use std::{error::Error, fmt};

use super::ScopeError;

/// Collection of [`ScopeError`]s produced during a single collection pass.
///
/// # Examples
///
/// ```
/// use scoped_config::ScopeError;
/// let e = ScopeError::aggregate(vec![
///     ScopeError::structural("a", "overlay must be an object"),
///     ScopeError::structural("b", "tests cannot declare children"),
/// ]);
/// if let ScopeError::Aggregate(agg) = e {
///     assert_eq!(agg.len(), 2);
/// }
/// ```
#[derive(Debug, Default)]
pub struct AggregatedErrors(Vec<ScopeError>);

impl AggregatedErrors {
    /// Create a new aggregation from a vector of errors.
    #[must_use]
    pub const fn new(errors: Vec<ScopeError>) -> Self {
        Self(errors)
    }

    /// Iterate over the contained errors.
    #[must_use = "iterators should be consumed to inspect errors"]
    pub fn iter(&self) -> std::slice::Iter<'_, ScopeError> {
        self.0.iter()
    }

    /// Number of errors in the aggregation.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the aggregation holds no errors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AggregatedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {e}", i + 1)?;
        }
        Ok(())
    }
}

impl Error for AggregatedErrors {}

impl<'a> IntoIterator for &'a AggregatedErrors {
    type Item = &'a ScopeError;
    type IntoIter = std::slice::Iter<'a, ScopeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for AggregatedErrors {
    type Item = ScopeError;
    type IntoIter = std::vec::IntoIter<ScopeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
