//! Test helpers shared across crates.
//!
//! This crate provides runtime browser identities, an observation recorder
//! for test bodies and small assertion helpers returning body errors.

pub mod assertions;
pub mod browsers;
pub mod recorder;
