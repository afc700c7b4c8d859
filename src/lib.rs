//! Slipway - a cross-compilation build matrix and release packaging tool
//!
//! This crate provides the core library functionality for Slipway:
//! resolving a declarative (build host -> targets) matrix, building the
//! packaged application once per target with per-target toolchain and
//! environment overrides, and running the post-install pipeline that
//! turns each raw binary into a documented, completion-equipped release
//! archive.

pub mod builder;
pub mod core;
pub mod errors;
pub mod matrix;
pub mod ops;
pub mod postinstall;
pub mod util;

pub use crate::core::{
    app::AppEntry, host::BuildHost, package::BuiltArtifact, package::PackageTemplate,
    target::TargetSpec, triple::TargetTriple,
};

pub use errors::Error;
pub use matrix::TargetMatrix;
