//! Trait-based conversions between external error types and `ScopeError`.

use figment::Error as FigmentError;

use super::ScopeError;

impl From<FigmentError> for ScopeError {
    fn from(e: FigmentError) -> Self {
        Self::baseline(e)
    }
}

impl From<ScopeError> for FigmentError {
    /// Allow using `?` in tests that return `figment::Error`.
    fn from(e: ScopeError) -> Self {
        match e {
            ScopeError::Baseline(fe) => *fe,
            other => Self::from(other.to_string()),
        }
    }
}
