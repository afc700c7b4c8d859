//! High-level operations.
//!
//! This module contains the implementation of Slipway commands.

pub mod release;

pub use release::{plan, release, ReleaseOptions, ReleaseResult, TargetPlan};
