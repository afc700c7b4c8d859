//! The target matrix: build host -> named targets -> specs.
//!
//! The matrix is plain data, defined once and passed in wherever it is
//! needed; there is no process-wide matrix state. [`TargetMatrix::builtin`]
//! carries the production table and [`TargetMatrix::from_path`] loads an
//! alternative table from TOML, so tests can substitute a minimal matrix.
//!
//! Adding a target means adding an entry here (or to the TOML file); no
//! other code path changes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::toolchain::ToolchainHandle;
use crate::core::host::BuildHost;
use crate::core::package::BuildOverride;
use crate::core::target::TargetSpec;
use crate::errors::{Error, Result};

/// Static table mapping each supported build host to its named targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMatrix {
    hosts: BTreeMap<BuildHost, BTreeMap<String, TargetSpec>>,
}

impl TargetMatrix {
    /// An empty matrix.
    pub fn new() -> Self {
        TargetMatrix {
            hosts: BTreeMap::new(),
        }
    }

    /// The production matrix.
    pub fn builtin() -> Self {
        let mut matrix = TargetMatrix::new();

        matrix
            .entry(BuildHost::new("x86_64", "linux"))
            .extend([
                (
                    "x86_64-linux".to_string(),
                    TargetSpec::native("x86_64-unknown-linux-musl"),
                ),
                (
                    "arm64-linux".to_string(),
                    TargetSpec::emulated("aarch64-unknown-linux-musl", "qemu-aarch64"),
                ),
                (
                    "x86_64-windows".to_string(),
                    TargetSpec::foreign_os("x86_64-pc-windows-gnu", "wine", &["windows-pthreads"]),
                ),
            ]);

        matrix.entry(BuildHost::new("aarch64", "linux")).extend([(
            "arm64-linux".to_string(),
            TargetSpec::native("aarch64-unknown-linux-musl"),
        )]);

        matrix.entry(BuildHost::new("x86_64", "darwin")).extend([(
            "x86_64-darwin".to_string(),
            TargetSpec::native("x86_64-apple-darwin"),
        )]);

        matrix
            .entry(BuildHost::new("aarch64", "darwin"))
            .extend([
                (
                    "arm64-darwin".to_string(),
                    TargetSpec::native("aarch64-apple-darwin"),
                ),
                // Rosetta runs the x86_64 binary transparently.
                (
                    "x86_64-darwin".to_string(),
                    TargetSpec::native("x86_64-apple-darwin"),
                ),
            ]);

        matrix
    }

    /// Load a matrix from a TOML file and validate its shape.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read matrix file: {}", path.display()))?;
        let matrix: TargetMatrix = toml::from_str(&contents)
            .with_context(|| format!("invalid matrix file: {}", path.display()))?;
        matrix
            .validate()
            .with_context(|| format!("invalid matrix file: {}", path.display()))?;
        Ok(matrix)
    }

    /// Mutable access to one host's target map, inserting it if absent.
    pub fn entry(&mut self, host: BuildHost) -> &mut BTreeMap<String, TargetSpec> {
        self.hosts.entry(host).or_default()
    }

    /// Supported build hosts, in stable order.
    pub fn hosts(&self) -> impl Iterator<Item = &BuildHost> {
        self.hosts.keys()
    }

    /// The ordered target map for a host.
    pub fn lookup(&self, host: &BuildHost) -> Result<&BTreeMap<String, TargetSpec>> {
        self.hosts.get(host).ok_or_else(|| Error::UnsupportedHost {
            host: host.to_string(),
            available: join_or_none(self.hosts.keys().map(|h| h.to_string())),
        })
    }

    /// The [`TargetSpec`] for a named target under a host.
    pub fn spec(&self, host: &BuildHost, target: &str) -> Result<&TargetSpec> {
        let targets = self.lookup(host)?;
        targets.get(target).ok_or_else(|| Error::UnsupportedTarget {
            host: host.to_string(),
            target: target.to_string(),
            available: join_or_none(targets.keys().cloned()),
        })
    }

    /// Compose the build override for a named target.
    ///
    /// Deterministic: identical inputs yield structurally equal overrides.
    pub fn resolve_override(
        &self,
        host: &BuildHost,
        target: &str,
        toolchain: &ToolchainHandle,
    ) -> Result<BuildOverride> {
        let spec = self.spec(host, target)?;
        Ok(spec.kind.override_for(&spec.triple, toolchain))
    }

    /// Check the matrix invariant: every target name maps to exactly one
    /// non-empty, well-formed compilation triple.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (host, targets) in &self.hosts {
            if targets.is_empty() {
                anyhow::bail!("host `{host}` has no targets");
            }
            for (name, spec) in targets {
                if !spec.triple.is_well_formed() {
                    anyhow::bail!(
                        "target `{name}` under host `{host}` has malformed triple `{}`",
                        spec.triple
                    );
                }
            }
        }
        Ok(())
    }
}

impl Default for TargetMatrix {
    fn default() -> Self {
        TargetMatrix::builtin()
    }
}

fn join_or_none(items: impl Iterator<Item = String>) -> String {
    let joined: Vec<String> = items.collect();
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined.join(", ")
    }
}
