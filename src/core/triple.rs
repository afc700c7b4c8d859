//! Compilation triples.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::host::{normalize_arch, BuildHost};

/// An `arch-vendor-os(-env)` string identifying a target platform to the
/// toolchain, e.g. `aarch64-unknown-linux-musl` or `x86_64-pc-windows-gnu`.
///
/// The raw string is kept verbatim; accessors parse components on demand.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTriple(String);

impl TargetTriple {
    /// Wrap a raw triple string.
    pub fn new(raw: impl Into<String>) -> Self {
        TargetTriple(raw.into())
    }

    /// The raw triple string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the triple is non-empty and has at least arch + OS parts.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.split('-').count() >= 2
    }

    /// Normalized architecture component.
    pub fn arch(&self) -> String {
        normalize_arch(self.0.split('-').next().unwrap_or_default())
    }

    /// Normalized OS component (`linux`, `darwin`, `windows`, or the raw
    /// third component for anything else).
    pub fn os(&self) -> String {
        if self.0.contains("darwin") || self.0.contains("apple") {
            "darwin".to_string()
        } else if self.0.contains("windows") {
            "windows".to_string()
        } else if self.0.contains("linux") {
            "linux".to_string()
        } else {
            self.0.split('-').nth(2).unwrap_or_default().to_string()
        }
    }

    /// Environment/ABI component, if present (`musl`, `gnu`, `msvc`).
    pub fn env(&self) -> Option<&str> {
        let parts: Vec<&str> = self.0.split('-').collect();
        if parts.len() >= 4 {
            Some(parts[3])
        } else {
            None
        }
    }

    /// Executable suffix for binaries built for this triple.
    pub fn exe_suffix(&self) -> &'static str {
        if self.os() == "windows" {
            ".exe"
        } else {
            ""
        }
    }

    /// The cargo linker environment variable for this triple, e.g.
    /// `CARGO_TARGET_AARCH64_UNKNOWN_LINUX_MUSL_LINKER`.
    pub fn linker_env_var(&self) -> String {
        format!(
            "CARGO_TARGET_{}_LINKER",
            self.0.replace('-', "_").to_uppercase()
        )
    }

    /// The per-triple C compiler override variable, e.g.
    /// `CC_aarch64_unknown_linux_musl`.
    pub fn cc_env_var(&self) -> String {
        format!("CC_{}", self.0.replace('-', "_"))
    }

    /// Whether a binary for this triple executes natively on `host`.
    ///
    /// Same arch + same OS is always compatible. On darwin hosts a
    /// foreign-arch darwin binary still runs (Rosetta).
    pub fn executes_natively_on(&self, host: &BuildHost) -> bool {
        if self.os() != host.os() {
            return false;
        }
        self.arch() == host.arch() || host.os() == "darwin"
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetTriple {
    fn from(s: &str) -> Self {
        TargetTriple::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let t = TargetTriple::new("aarch64-unknown-linux-musl");
        assert_eq!(t.arch(), "aarch64");
        assert_eq!(t.os(), "linux");
        assert_eq!(t.env(), Some("musl"));
        assert_eq!(t.exe_suffix(), "");
    }

    #[test]
    fn test_windows_triple() {
        let t = TargetTriple::new("x86_64-pc-windows-gnu");
        assert_eq!(t.arch(), "x86_64");
        assert_eq!(t.os(), "windows");
        assert_eq!(t.env(), Some("gnu"));
        assert_eq!(t.exe_suffix(), ".exe");
    }

    #[test]
    fn test_darwin_triple() {
        let t = TargetTriple::new("aarch64-apple-darwin");
        assert_eq!(t.os(), "darwin");
        assert_eq!(t.env(), None);
    }

    #[test]
    fn test_env_var_names() {
        let t = TargetTriple::new("aarch64-unknown-linux-musl");
        assert_eq!(
            t.linker_env_var(),
            "CARGO_TARGET_AARCH64_UNKNOWN_LINUX_MUSL_LINKER"
        );
        assert_eq!(t.cc_env_var(), "CC_aarch64_unknown_linux_musl");
    }

    #[test]
    fn test_native_execution() {
        let linux = BuildHost::new("x86_64", "linux");
        assert!(TargetTriple::new("x86_64-unknown-linux-musl").executes_natively_on(&linux));
        assert!(!TargetTriple::new("aarch64-unknown-linux-musl").executes_natively_on(&linux));
        assert!(!TargetTriple::new("x86_64-pc-windows-gnu").executes_natively_on(&linux));

        // Rosetta: foreign-arch darwin binaries run on darwin hosts.
        let mac = BuildHost::new("aarch64", "darwin");
        assert!(TargetTriple::new("x86_64-apple-darwin").executes_natively_on(&mac));
    }
}
