//! Primary error enums for collection and execution flows.

use std::fmt;

use figment::Error as FigmentError;
use thiserror::Error;

use super::aggregate::AggregatedErrors;
use crate::tree::NodeId;

/// Boxed error returned by test bodies and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort collection or execution.
///
/// Test-body failures are not represented here; they are isolated per test
/// and reported through [`BodyFailure`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScopeError {
    /// Malformed declaration found while building the scope tree.
    #[error("malformed declaration at '{path}': {message}")]
    Structural {
        /// Full title of the offending declaration.
        path: String,
        /// Human-readable description of the problem.
        message: String,
    },

    /// The configuration cell did not return to its pre-test snapshot.
    #[error("configuration leaked out of '{test}': {detail}")]
    LeakDetected {
        /// Full title of the test whose window leaked.
        test: String,
        /// What differed between the snapshot and the restored cell.
        detail: String,
    },

    /// A node id that does not belong to the tree being queried.
    #[error("unknown scope node {0}")]
    UnknownNode(NodeId),

    /// Baseline configuration could not be composed.
    #[error("failed to compose baseline configuration: {0}")]
    Baseline(#[from] Box<FigmentError>),

    /// Several errors were collected from independent branches.
    #[error("multiple declaration errors:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}

/// Lifecycle phase in which a body or hook failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Phase {
    /// Suite-level hook run once before the suite's tests.
    BeforeAll,
    /// Hook run before every test of a suite.
    BeforeEach,
    /// The test body itself.
    Body,
    /// Hook run after every test of a suite.
    AfterEach,
    /// Suite-level hook run once after the suite's tests.
    AfterAll,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BeforeAll => "before all hook",
            Self::BeforeEach => "before each hook",
            Self::Body => "test body",
            Self::AfterEach => "after each hook",
            Self::AfterAll => "after all hook",
        };
        f.write_str(label)
    }
}

/// Failure raised by a test body or one of its hooks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BodyFailure {
    /// The callable returned an error.
    #[error("{phase} failed: {source}")]
    Error {
        /// Phase that produced the error.
        phase: Phase,
        /// Error returned by the callable.
        #[source]
        source: BoxError,
    },

    /// The callable panicked.
    #[error("{phase} panicked: {message}")]
    Panic {
        /// Phase that panicked.
        phase: Phase,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl BodyFailure {
    /// Phase in which the failure occurred.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Error { phase, .. } | Self::Panic { phase, .. } => *phase,
        }
    }
}
