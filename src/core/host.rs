//! Build host identification.
//!
//! A [`BuildHost`] names the machine performing compilation as an
//! `<arch>-<os>` pair (e.g. `x86_64-linux`, `aarch64-darwin`). Hosts are
//! the keys of the target matrix and are never mutated after parse.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Architecture + OS of the machine running the build.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildHost {
    arch: String,
    os: String,
}

impl BuildHost {
    /// Create a host from raw components, normalizing common aliases
    /// (`arm64` -> `aarch64`, `amd64` -> `x86_64`, `macos` -> `darwin`).
    pub fn new(arch: impl AsRef<str>, os: impl AsRef<str>) -> Self {
        BuildHost {
            arch: normalize_arch(arch.as_ref()),
            os: normalize_os(os.as_ref()),
        }
    }

    /// Detect the host this process is running on.
    pub fn detect() -> Self {
        BuildHost::new(std::env::consts::ARCH, std::env::consts::OS)
    }

    /// Normalized architecture (e.g. `x86_64`, `aarch64`).
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Normalized OS (`linux`, `darwin`, `windows`).
    pub fn os(&self) -> &str {
        &self.os
    }

    /// A compilation triple for host-side tooling (build drivers, codegen
    /// helpers). Toolchain resolution is parametrized separately for build
    /// and target platforms, so this is resolved like any other triple.
    pub fn native_triple(&self) -> crate::core::triple::TargetTriple {
        let raw = match self.os.as_str() {
            "darwin" => format!("{}-apple-darwin", self.arch),
            "windows" => format!("{}-pc-windows-msvc", self.arch),
            _ => format!("{}-unknown-linux-gnu", self.arch),
        };
        crate::core::triple::TargetTriple::new(raw)
    }
}

/// Normalize architecture aliases to the canonical toolchain spelling.
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "arm64" => "aarch64".to_string(),
        "amd64" | "x64" => "x86_64".to_string(),
        other => other.to_string(),
    }
}

/// Normalize OS aliases to the canonical spelling.
pub fn normalize_os(os: &str) -> String {
    match os {
        "macos" | "osx" => "darwin".to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for BuildHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.os)
    }
}

/// Error parsing a build host identifier.
#[derive(Debug, thiserror::Error)]
#[error("invalid build host `{0}`: expected `<arch>-<os>` (e.g. `x86_64-linux`)")]
pub struct ParseHostError(String);

impl FromStr for BuildHost {
    type Err = ParseHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((arch, os)) if !arch.is_empty() && !os.is_empty() => {
                Ok(BuildHost::new(arch, os))
            }
            _ => Err(ParseHostError(s.to_string())),
        }
    }
}

impl TryFrom<String> for BuildHost {
    type Error = ParseHostError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BuildHost> for String {
    fn from(host: BuildHost) -> String {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let host: BuildHost = "x86_64-linux".parse().unwrap();
        assert_eq!(host.arch(), "x86_64");
        assert_eq!(host.os(), "linux");
        assert_eq!(host.to_string(), "x86_64-linux");
    }

    #[test]
    fn test_aliases_normalized() {
        let host: BuildHost = "arm64-macos".parse().unwrap();
        assert_eq!(host.arch(), "aarch64");
        assert_eq!(host.os(), "darwin");
        assert_eq!(host, BuildHost::new("aarch64", "darwin"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!("x86_64".parse::<BuildHost>().is_err());
        assert!("-linux".parse::<BuildHost>().is_err());
        assert!("".parse::<BuildHost>().is_err());
    }

    #[test]
    fn test_native_triple() {
        let host = BuildHost::new("x86_64", "linux");
        assert_eq!(host.native_triple().as_str(), "x86_64-unknown-linux-gnu");

        let host = BuildHost::new("aarch64", "darwin");
        assert_eq!(host.native_triple().as_str(), "aarch64-apple-darwin");
    }
}
