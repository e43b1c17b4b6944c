//! Hierarchical, scope-bound configuration overlays for test suites.
//!
//! Suites and tests form a [`ScopeTree`]; each node may declare an
//! [`Overlay`]. [`resolve`] merges the overlays on a node's root-to-node
//! chain into its [`EffectiveConfig`], [`should_run`] checks the result
//! against the [`RuntimeBrowser`], and [`ScopeController`] makes the merged
//! view observable through a [`ConfigCell`] for exactly the span of one test
//! before restoring whatever was there before. [`Runner`] drives the
//! controller over a whole tree.
//!
//! ```rust
//! use scoped_config::{
//!     Baseline, ConfigSchema, Declaration, Runner, RuntimeBrowser, ScopeController, ScopeTree,
//! };
//! use serde_json::json;
//!
//! let tree = ScopeTree::build(
//!     ConfigSchema::default(),
//!     Declaration::suite("per-test config")
//!         .with_overlay(json!({"env": {"BAR": "b"}}))
//!         .child(
//!             Declaration::test("set various config values", |cx| {
//!                 assert_eq!(cx.config().get("defaultCommandTimeout"), Some(json!(200)));
//!                 assert_eq!(cx.config().env_var("FOO_VALUE"), Some(json!("foo")));
//!                 assert_eq!(cx.config().env_var("BAR"), Some(json!("b")));
//!                 Ok(())
//!             })
//!             .with_overlay(json!({"defaultCommandTimeout": 200, "env": {"FOO_VALUE": "foo"}})),
//!         )
//!         .child(Declaration::test("does not leak", |cx| {
//!             assert_eq!(cx.config().get("defaultCommandTimeout"), Some(json!(4000)));
//!             assert_eq!(cx.config().env_var("FOO_VALUE"), None);
//!             Ok(())
//!         })),
//! )?;
//! let runner = Runner::new(ScopeController::new(
//!     Baseline::from_value(&json!({"defaultCommandTimeout": 4000}))?,
//!     RuntimeBrowser::new("chrome", "chromium"),
//! ));
//! assert!(runner.run(&tree)?.is_success());
//! # Ok::<_, scoped_config::ScopeError>(())
//! ```

mod baseline;
mod cell;
mod context;
mod controller;
mod error;
mod gate;
mod only;
mod overlay;
mod resolve;
mod runner;
mod schema;
mod tree;

pub use baseline::{Baseline, BaselineSources, DEFAULT_CONFIG_PREFIX, DEFAULT_ENV_PREFIX};
pub use cell::{ActivationGuard, ConfigCell, ConfigHandle, Snapshot};
pub use context::TestContext;
pub use controller::{ScopeController, TestOutcome};
pub use error::{AggregatedErrors, BodyFailure, BoxError, Phase, ScopeError, ScopeResult};
pub use gate::{GateDecision, RuntimeBrowser, should_run};
pub use only::has_only;
pub use overlay::{Overlay, OverlayError};
pub use resolve::{EffectiveConfig, resolve};
pub use runner::{HookFailure, RunReport, Runner, TestReport};
pub use schema::{BROWSER_KEY, ConfigSchema, ENV_KEY, MergeStrategy};
pub use tree::{
    Ancestors, Callback, Declaration, HookKind, NodeId, NodeKind, ScopeNode, ScopeTree,
    ScopeTreeBuilder, SuiteHooks,
};
