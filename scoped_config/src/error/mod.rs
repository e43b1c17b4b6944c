//! Error types produced while collecting and running scope trees.

mod aggregate;
mod constructors;
mod conversions;
mod types;

pub use aggregate::AggregatedErrors;
pub use types::{BodyFailure, BoxError, Phase, ScopeError};

/// Result alias used throughout the crate.
pub type ScopeResult<T> = Result<T, ScopeError>;
