//! App entries: the uniform "run this binary" projection over a built
//! artifact, consumed by an external invocation driver.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::package::BuiltArtifact;

/// An externally invocable app entry.
///
/// The JSON shape (`{"kind": "app", "program": ...}`) is a stable contract;
/// new fields may be added but existing ones must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Always `"app"`.
    pub kind: String,

    /// Absolute path to the executable.
    pub program: PathBuf,
}

/// Project a built artifact to its app entry. Pure; no side effects.
///
/// The program path defaults to the binary name inside the install dir and
/// honors a non-default executable sub-path when the artifact declares one.
pub fn expose(artifact: &BuiltArtifact) -> AppEntry {
    AppEntry {
        kind: "app".to_string(),
        program: artifact.binary_path(),
    }
}
