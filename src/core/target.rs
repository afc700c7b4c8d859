//! Target specifications.
//!
//! A target is a host-scoped, named configuration describing the platform
//! the produced binary must run on. Each [`TargetSpec`] carries a
//! compilation triple and a [`TargetKind`], the tagged variant that fixes
//! how the target's build overrides are composed. The composition rules
//! are data-driven and inspectable; there is no per-target closure.

use serde::{Deserialize, Serialize};

use crate::builder::toolchain::ToolchainHandle;
use crate::core::package::BuildOverride;
use crate::core::triple::TargetTriple;
use crate::postinstall::emulation::ExecStrategy;

/// How a target relates to the host it is built on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TargetKind {
    /// Host can run the produced binary directly.
    Native,

    /// Same OS, foreign architecture; the binary runs under a CPU
    /// emulator during post-install.
    CpuEmulation {
        /// Emulator program, e.g. `qemu-aarch64`.
        emulator: String,
    },

    /// Foreign OS; the binary runs under a compatibility runtime
    /// (e.g. wine) with an isolated per-build environment directory.
    OsCompatibility {
        /// Compatibility runtime program, e.g. `wine`.
        runtime: String,

        /// Extra build-time-only inputs this target needs
        /// (e.g. a threading library for Windows).
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        extra_inputs: Vec<String>,
    },
}

impl TargetKind {
    /// The execution strategy the post-install pipeline uses for binaries
    /// of this kind.
    pub fn exec_strategy(&self) -> ExecStrategy {
        match self {
            TargetKind::Native => ExecStrategy::Native,
            TargetKind::CpuEmulation { emulator } => ExecStrategy::CpuEmulation {
                emulator: emulator.clone(),
            },
            TargetKind::OsCompatibility { runtime, .. } => ExecStrategy::OsCompatibility {
                runtime: runtime.clone(),
            },
        }
    }

    /// Compose the build override for this kind.
    ///
    /// Native targets add nothing. Cross targets select the resolved cross
    /// compiler as the target C compiler and linker, and append a
    /// linker-selection flag. Appended flags layer on top of the
    /// template's baseline static flags; they never replace them.
    pub fn override_for(
        &self,
        triple: &TargetTriple,
        toolchain: &ToolchainHandle,
    ) -> BuildOverride {
        let mut ov = BuildOverride::new(triple.clone(), self.exec_strategy());

        match self {
            TargetKind::Native => {}
            TargetKind::CpuEmulation { .. } | TargetKind::OsCompatibility { .. } => {
                ov.env
                    .insert("TARGET_CC".to_string(), toolchain.cc.display().to_string());
                ov.env.insert(
                    triple.linker_env_var(),
                    toolchain.linker.display().to_string(),
                );
                ov.rustflags.push("-C".to_string());
                ov.rustflags
                    .push(format!("linker={}", toolchain.linker.display()));
            }
        }

        if let TargetKind::OsCompatibility { extra_inputs, .. } = self {
            ov.build_inputs.extend(extra_inputs.iter().cloned());
        }

        ov
    }
}

/// Compilation triple plus override rule for one named target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Triple handed to the toolchain.
    pub triple: TargetTriple,

    /// Override-composition rule.
    #[serde(flatten)]
    pub kind: TargetKind,
}

impl TargetSpec {
    /// A native target for the given triple.
    pub fn native(triple: impl Into<TargetTriple>) -> Self {
        TargetSpec {
            triple: triple.into(),
            kind: TargetKind::Native,
        }
    }

    /// A foreign-architecture target run under a CPU emulator.
    pub fn emulated(triple: impl Into<TargetTriple>, emulator: impl Into<String>) -> Self {
        TargetSpec {
            triple: triple.into(),
            kind: TargetKind::CpuEmulation {
                emulator: emulator.into(),
            },
        }
    }

    /// A foreign-OS target run under a compatibility runtime.
    pub fn foreign_os(
        triple: impl Into<TargetTriple>,
        runtime: impl Into<String>,
        extra_inputs: &[&str],
    ) -> Self {
        TargetSpec {
            triple: triple.into(),
            kind: TargetKind::OsCompatibility {
                runtime: runtime.into(),
                extra_inputs: extra_inputs.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn toolchain(triple: &TargetTriple) -> ToolchainHandle {
        ToolchainHandle {
            triple: triple.clone(),
            cc: PathBuf::from("/cross/bin/aarch64-unknown-linux-musl-gcc"),
            linker: PathBuf::from("/cross/bin/aarch64-unknown-linux-musl-gcc"),
            ar: None,
        }
    }

    #[test]
    fn test_native_override_is_empty() {
        let triple = TargetTriple::new("x86_64-unknown-linux-musl");
        let ov = TargetKind::Native.override_for(&triple, &toolchain(&triple));
        assert!(ov.env.is_empty());
        assert!(ov.rustflags.is_empty());
        assert!(ov.build_inputs.is_empty());
        assert_eq!(ov.strategy, ExecStrategy::Native);
    }

    #[test]
    fn test_cross_override_selects_linker() {
        let triple = TargetTriple::new("aarch64-unknown-linux-musl");
        let kind = TargetKind::CpuEmulation {
            emulator: "qemu-aarch64".into(),
        };
        let ov = kind.override_for(&triple, &toolchain(&triple));

        assert_eq!(
            ov.env.get("TARGET_CC").unwrap(),
            "/cross/bin/aarch64-unknown-linux-musl-gcc"
        );
        assert!(ov
            .env
            .contains_key("CARGO_TARGET_AARCH64_UNKNOWN_LINUX_MUSL_LINKER"));
        assert_eq!(
            ov.rustflags,
            vec![
                "-C".to_string(),
                "linker=/cross/bin/aarch64-unknown-linux-musl-gcc".to_string()
            ]
        );
    }

    #[test]
    fn test_foreign_os_adds_build_inputs() {
        let triple = TargetTriple::new("x86_64-pc-windows-gnu");
        let kind = TargetKind::OsCompatibility {
            runtime: "wine".into(),
            extra_inputs: vec!["windows-pthreads".into()],
        };
        let ov = kind.override_for(&triple, &toolchain(&triple));
        assert_eq!(ov.build_inputs, vec!["windows-pthreads".to_string()]);
        assert!(ov.strategy.needs_os_compatibility_layer());
    }

    #[test]
    fn test_override_is_deterministic() {
        let triple = TargetTriple::new("aarch64-unknown-linux-musl");
        let kind = TargetKind::CpuEmulation {
            emulator: "qemu-aarch64".into(),
        };
        let a = kind.override_for(&triple, &toolchain(&triple));
        let b = kind.override_for(&triple, &toolchain(&triple));
        assert_eq!(a, b);
    }

    #[test]
    fn test_spec_serde_roundtrip() {
        let spec = TargetSpec::foreign_os("x86_64-pc-windows-gnu", "wine", &["windows-pthreads"]);
        let toml = toml::to_string(&spec).unwrap();
        let back: TargetSpec = toml::from_str(&toml).unwrap();
        assert_eq!(spec, back);
    }
}
