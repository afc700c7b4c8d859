//! Execution strategies for freshly built binaries.
//!
//! The post-install pipeline must run the binary it just produced. Whether
//! that is a direct invocation, a CPU emulator, or an OS-compatibility
//! runtime is a pure function of (build host, target triple); the chosen
//! [`ExecStrategy`] supplies the invocation prefix and the capability set.

use serde::{Deserialize, Serialize};

use crate::core::host::BuildHost;
use crate::core::triple::TargetTriple;

/// How a target binary is executed on the build host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ExecStrategy {
    /// Direct invocation; empty prefix.
    Native,

    /// Foreign architecture, same OS family: run under a user-mode CPU
    /// emulator.
    CpuEmulation { emulator: String },

    /// Foreign OS: run under a compatibility runtime with an isolated,
    /// freshly created environment directory per invocation.
    OsCompatibility { runtime: String },
}

impl ExecStrategy {
    /// Select the strategy for running a `triple` binary on `host`, or
    /// `None` when no supported execution path exists (a foreign OS with
    /// no compatibility runtime; user-mode emulation only bridges
    /// architectures, not operating systems).
    pub fn detect(host: &BuildHost, triple: &TargetTriple) -> Option<ExecStrategy> {
        if triple.executes_natively_on(host) {
            return Some(ExecStrategy::Native);
        }

        if triple.os() == "windows" && host.os() != "windows" {
            return Some(ExecStrategy::OsCompatibility {
                runtime: "wine".to_string(),
            });
        }

        if triple.os() == host.os() {
            return Some(ExecStrategy::CpuEmulation {
                emulator: qemu_for_arch(&triple.arch()),
            });
        }

        None
    }

    pub fn can_execute_natively(&self) -> bool {
        matches!(self, ExecStrategy::Native)
    }

    pub fn needs_cpu_emulation(&self) -> bool {
        matches!(self, ExecStrategy::CpuEmulation { .. })
    }

    pub fn needs_os_compatibility_layer(&self) -> bool {
        matches!(self, ExecStrategy::OsCompatibility { .. })
    }

    /// Invocation prefix placed ahead of the binary path. Empty for native
    /// execution.
    pub fn prefix(&self) -> Vec<String> {
        match self {
            ExecStrategy::Native => Vec::new(),
            ExecStrategy::CpuEmulation { emulator } => vec![emulator.clone()],
            ExecStrategy::OsCompatibility { runtime } => vec![runtime.clone()],
        }
    }

    /// Environment variable naming the isolated environment directory for
    /// the compatibility runtime, if this strategy needs one.
    pub fn isolation_env_var(&self) -> Option<&'static str> {
        match self {
            ExecStrategy::OsCompatibility { .. } => Some("WINEPREFIX"),
            _ => None,
        }
    }
}

/// User-mode qemu binary name for a target architecture.
fn qemu_for_arch(arch: &str) -> String {
    let cpu = match arch {
        "i686" | "i586" => "i386",
        "arm" | "armv6l" | "armv7l" => "arm",
        other => other,
    };
    format!("qemu-{cpu}")
}
