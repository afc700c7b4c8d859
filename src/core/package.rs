//! Package template, overrides, and the merge policy between them.
//!
//! A [`PackageTemplate`] is the common, host-independent description of the
//! buildable unit. A [`BuildOverride`] is composed per target by its
//! [`TargetKind`](crate::core::target::TargetKind) and layered on top of the
//! template to produce a [`ResolvedPackage`], which lives only for the
//! duration of one build invocation.
//!
//! Merge policy: scalar fields are replaced by the override, list fields are
//! concatenated template-then-override, and post-install execution is the
//! override's emulation strategy wrapped around the baseline generator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::triple::TargetTriple;
use crate::postinstall::emulation::ExecStrategy;

/// Baseline rustflags forcing a statically linked binary. Targets may
/// append linker-selection flags on top, never replace these.
pub const STATIC_FLAGS: &[&str] = &["-C", "target-feature=+crt-static"];

/// Common, host-independent description of the package being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTemplate {
    /// Package (and binary) name.
    pub name: String,

    /// Source tree root.
    pub source_root: PathBuf,

    /// Optional ignore file whose glob patterns filter the source tree
    /// when it is staged for building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_file: Option<PathBuf>,

    /// Run the package's own test suite while packaging. Off: release
    /// packaging assumes tests ran in CI already.
    #[serde(default)]
    pub run_tests: bool,

    /// Run a dependency audit while packaging. Off for the same reason.
    #[serde(default)]
    pub run_audit: bool,

    /// Strict dependency mode: refuse to build if the lockfile is stale.
    #[serde(default = "default_true")]
    pub locked: bool,

    /// Baseline static-linking rustflags, always applied first.
    pub static_flags: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl PackageTemplate {
    /// Create a template with the baseline packaging defaults: tests and
    /// audit disabled, strict dependency mode, static linking.
    pub fn new(name: impl Into<String>, source_root: impl Into<PathBuf>) -> Self {
        PackageTemplate {
            name: name.into(),
            source_root: source_root.into(),
            ignore_file: None,
            run_tests: false,
            run_audit: false,
            locked: true,
            static_flags: STATIC_FLAGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Set the ignore file used to filter the source tree.
    pub fn with_ignore_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore_file = Some(path.into());
        self
    }

    /// Merge one override onto this template.
    pub fn merge(&self, ov: &BuildOverride) -> ResolvedPackage {
        let mut rustflags = self.static_flags.clone();
        rustflags.extend(ov.rustflags.iter().cloned());

        ResolvedPackage {
            name: self.name.clone(),
            source_root: self.source_root.clone(),
            ignore_file: self.ignore_file.clone(),
            triple: ov.triple.clone(),
            locked: self.locked,
            build_inputs: ov.build_inputs.clone(),
            env: ov.env.clone(),
            rustflags,
            strategy: ov.strategy.clone(),
        }
    }
}

/// Per-target environment additions, produced fresh for each build
/// invocation and never shared across targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOverride {
    /// Compilation triple (scalar: replaces the template's notion of
    /// "what platform").
    pub triple: TargetTriple,

    /// Extra build-time-only inputs (concatenated onto the template's).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_inputs: Vec<String>,

    /// Environment variables (target compiler path, linker selection).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Rustflags appended after the template's static baseline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rustflags: Vec<String>,

    /// How the produced binary is executed during post-install.
    pub strategy: ExecStrategy,
}

impl BuildOverride {
    /// An override carrying only a triple and an execution strategy.
    pub fn new(triple: TargetTriple, strategy: ExecStrategy) -> Self {
        BuildOverride {
            triple,
            build_inputs: Vec::new(),
            env: BTreeMap::new(),
            rustflags: Vec::new(),
            strategy,
        }
    }
}

/// A template merged with one override; input to the toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub source_root: PathBuf,
    pub ignore_file: Option<PathBuf>,
    pub triple: TargetTriple,
    pub locked: bool,
    pub build_inputs: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Template static flags followed by override flags, in that order.
    pub rustflags: Vec<String>,
    pub strategy: ExecStrategy,
}

impl ResolvedPackage {
    /// Binary file name for this package on the resolved triple.
    pub fn binary_name(&self) -> String {
        format!("{}{}", self.name, self.triple.exe_suffix())
    }
}

/// The produced binary and its on-disk layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltArtifact {
    /// Package name.
    pub package: String,

    /// Target name this artifact was built for.
    pub target: String,

    /// Compilation triple.
    pub triple: TargetTriple,

    /// Install directory holding the binary and generated artifacts.
    pub install_dir: PathBuf,

    /// Binary file name (includes `.exe` for Windows targets).
    pub binary_name: String,

    /// Non-default executable sub-path inside the install dir, if the
    /// artifact declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exe_subpath: Option<PathBuf>,
}

impl BuiltArtifact {
    /// Absolute path of the executable.
    pub fn binary_path(&self) -> PathBuf {
        match &self.exe_subpath {
            Some(sub) => self.install_dir.join(sub),
            None => self.install_dir.join(&self.binary_name),
        }
    }

    /// Path of the executable relative to the install dir.
    pub fn exe_relative_path(&self) -> PathBuf {
        match &self.exe_subpath {
            Some(sub) => sub.clone(),
            None => Path::new(&self.binary_name).to_path_buf(),
        }
    }
}
