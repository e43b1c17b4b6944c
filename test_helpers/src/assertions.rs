//! Assertion helpers for test bodies that report failures as errors.

use std::fmt::Debug;

use anyhow::anyhow;
use scoped_config::BoxError;

/// Fail with a descriptive error unless `actual == expected`.
///
/// # Errors
///
/// Returns an error describing both values when they differ.
pub fn expect_eq<T>(what: &str, actual: &T, expected: &T) -> Result<(), BoxError>
where
    T: PartialEq + Debug + ?Sized,
{
    if actual == expected {
        Ok(())
    } else {
        let mismatch = anyhow!("{what}: expected {expected:?}, got {actual:?}");
        Err(mismatch.into())
    }
}

/// Fail with a descriptive error when `actual == unexpected`.
///
/// # Errors
///
/// Returns an error naming the rejected value when they are equal.
pub fn expect_ne<T>(what: &str, actual: &T, unexpected: &T) -> Result<(), BoxError>
where
    T: PartialEq + Debug + ?Sized,
{
    if actual == unexpected {
        Err(anyhow!("{what}: did not expect {unexpected:?}").into())
    } else {
        Ok(())
    }
}
