//! Command implementations.

pub mod apps;
pub mod build;
pub mod completions;
pub mod targets;

use anyhow::Result;
use std::path::Path;

use slipway::matrix::TargetMatrix;

/// Load the matrix from a file when one is given, otherwise the builtin.
pub fn load_matrix(path: Option<&Path>) -> Result<TargetMatrix> {
    match path {
        Some(path) => TargetMatrix::from_path(path),
        None => Ok(TargetMatrix::builtin()),
    }
}
