//! Toolchain resolution.
//!
//! A [`ToolchainResolver`] turns a (build host, target triple) pair into a
//! concrete compiler/linker set. Resolution is a pure probe of the
//! environment: an explicit per-triple env var wins, then a
//! triple-prefixed cross compiler on PATH, then -- for triples the host can
//! compile for directly -- the host's own compilers. The same resolver
//! serves the target platform and the build platform (host-side tooling),
//! so the two are parametrized independently even when equal.

use std::path::PathBuf;

use crate::core::host::BuildHost;
use crate::core::triple::TargetTriple;
use crate::errors::{Error, Result};

/// A resolved compiler/linker set for one (host, triple) pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainHandle {
    /// Triple this toolchain targets.
    pub triple: TargetTriple,

    /// C compiler path.
    pub cc: PathBuf,

    /// Linker path. Cross toolchains link through the compiler driver,
    /// so this is usually the same binary as `cc`.
    pub linker: PathBuf,

    /// Archiver, when one was found next to the compiler.
    pub ar: Option<PathBuf>,
}

/// Stateless resolver; a pure function of (host, triple) and the probe
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolchainResolver;

impl ToolchainResolver {
    pub fn new() -> Self {
        ToolchainResolver
    }

    /// Resolve a compiler/linker set for building `triple` binaries on
    /// `host`.
    pub fn resolve(&self, host: &BuildHost, triple: &TargetTriple) -> Result<ToolchainHandle> {
        // Explicit override always wins.
        if let Ok(cc) = std::env::var(triple.cc_env_var()) {
            let cc = PathBuf::from(cc);
            tracing::debug!(
                "using {} from {} for {}",
                cc.display(),
                triple.cc_env_var(),
                triple
            );
            return Ok(ToolchainHandle {
                triple: triple.clone(),
                linker: cc.clone(),
                ar: find_tool(&format!("{triple}-ar")),
                cc,
            });
        }

        // Target-prefixed cross compiler on PATH.
        for suffix in ["cc", "gcc", "clang"] {
            if let Some(cc) = find_tool(&format!("{triple}-{suffix}")) {
                tracing::debug!("using cross compiler {} for {}", cc.display(), triple);
                return Ok(ToolchainHandle {
                    triple: triple.clone(),
                    linker: cc.clone(),
                    ar: find_tool(&format!("{triple}-ar")),
                    cc,
                });
            }
        }

        // Host compilers cover triples the host can target directly.
        if triple.os() == host.os() {
            if let Some(cc) = find_host_compiler() {
                tracing::debug!("using host compiler {} for {}", cc.display(), triple);
                return Ok(ToolchainHandle {
                    triple: triple.clone(),
                    linker: cc.clone(),
                    ar: find_tool("ar"),
                    cc,
                });
            }
        }

        Err(Error::ToolchainUnavailable {
            host: host.to_string(),
            triple: triple.to_string(),
            detail: format!(
                "no `{triple}-cc`/`{triple}-gcc` on PATH and `{}` is unset",
                triple.cc_env_var()
            ),
        })
    }
}

/// Find an executable on PATH.
fn find_tool(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find the host's own C compiler: `CC` env var first, then the usual
/// suspects.
fn find_host_compiler() -> Option<PathBuf> {
    if let Ok(cc) = std::env::var("CC") {
        if let Some(path) = find_tool(&cc) {
            return Some(path);
        }
        let path = PathBuf::from(&cc);
        if path.is_absolute() && path.exists() {
            return Some(path);
        }
    }

    for compiler in ["cc", "gcc", "clang"] {
        if let Some(path) = find_tool(compiler) {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_wins() {
        // A triple nothing on PATH could ever satisfy.
        let triple = TargetTriple::new("sparc64-acme-plan9-musl");
        std::env::set_var(triple.cc_env_var(), "/opt/acme/bin/sparc-cc");

        let resolver = ToolchainResolver::new();
        let handle = resolver
            .resolve(&BuildHost::new("x86_64", "linux"), &triple)
            .unwrap();
        assert_eq!(handle.cc, PathBuf::from("/opt/acme/bin/sparc-cc"));
        assert_eq!(handle.linker, handle.cc);

        std::env::remove_var(triple.cc_env_var());
    }

    #[test]
    fn test_unresolvable_pairing_errors() {
        let resolver = ToolchainResolver::new();
        let err = resolver
            .resolve(
                &BuildHost::new("x86_64", "linux"),
                &TargetTriple::new("m68k-unknown-netbsd"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ToolchainUnavailable { .. }));
        assert!(!err.is_configuration_error());
    }

    #[test]
    #[cfg(unix)]
    fn test_host_triple_resolves_with_host_compiler() {
        // Unix build environments carry a `cc`; the host's own triple
        // resolves through it.
        let host = BuildHost::detect();
        let resolver = ToolchainResolver::new();
        if which::which("cc").is_ok() {
            let handle = resolver.resolve(&host, &host.native_triple()).unwrap();
            assert!(handle.cc.exists() || handle.cc.file_name().is_some());
        }
    }
}
