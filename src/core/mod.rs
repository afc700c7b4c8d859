//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - Build hosts and compilation triples
//! - Target specifications and override-composition rules
//! - The package template / override / merged-package trio
//! - Built artifacts and app entries

pub mod app;
pub mod host;
pub mod package;
pub mod target;
pub mod triple;

pub use app::{expose, AppEntry};
pub use host::BuildHost;
pub use package::{BuildOverride, BuiltArtifact, PackageTemplate, ResolvedPackage};
pub use target::{TargetKind, TargetSpec};
pub use triple::TargetTriple;
