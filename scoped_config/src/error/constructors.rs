//! Constructors and aggregation helpers for `ScopeError`.

use figment::Error as FigmentError;

use super::{AggregatedErrors, ScopeError};

impl ScopeError {
    /// Tries to build a [`ScopeError`] from an iterator of errors.
    ///
    /// The iterator is consumed eagerly. It returns:
    /// * `None` when no errors are supplied;
    /// * the error itself when exactly one is supplied; and
    /// * [`Self::Aggregate`] combining every error for two or more inputs.
    #[must_use]
    pub fn try_aggregate<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut collected: Vec<Self> = errors.into_iter().collect();
        match collected.len() {
            0 => None,
            1 => collected.pop(),
            _ => Some(Self::Aggregate(Box::new(AggregatedErrors::new(collected)))),
        }
    }

    /// Build a [`ScopeError`] from at least one error.
    ///
    /// # Panics
    ///
    /// Panics if `errors` is empty. Use [`ScopeError::try_aggregate`] to avoid
    /// panicking when the error list may be empty.
    #[must_use]
    #[track_caller]
    pub fn aggregate<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::try_aggregate(errors).map_or_else(
            || panic!("aggregate requires at least one error"),
            |err| err,
        )
    }

    /// Construct a structural error for the declaration at `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_config::ScopeError;
    /// let e = ScopeError::structural("suite > test", "tests cannot declare children");
    /// assert!(matches!(e, ScopeError::Structural { .. }));
    /// ```
    #[must_use]
    pub fn structural(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Structural {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Construct a leak error for the test at `test`.
    #[must_use]
    pub fn leak(test: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::LeakDetected {
            test: test.into(),
            detail: detail.into(),
        }
    }

    /// Construct a baseline error from a [`figment::Error`].
    ///
    /// # Examples
    ///
    /// ```
    /// use scoped_config::ScopeError;
    /// let e = ScopeError::baseline(figment::Error::from("boom"));
    /// assert!(matches!(e, ScopeError::Baseline(_)));
    /// ```
    #[must_use]
    pub fn baseline(source: FigmentError) -> Self {
        Self::Baseline(Box::new(source))
    }

    /// Whether the error signals an internal invariant violation.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::LeakDetected { .. })
    }
}
