//! Error taxonomy for matrix evaluation and per-target builds.
//!
//! Configuration-shape errors (`UnsupportedHost`, `UnsupportedTarget`) are
//! detected eagerly, before any toolchain resolution or process spawn, and
//! abort the whole matrix evaluation. The remaining variants are fatal for
//! a single target only; sibling targets keep building.

use thiserror::Error;

/// Error during matrix evaluation or a target build.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported build host `{host}`\navailable hosts: {available}")]
    UnsupportedHost { host: String, available: String },

    #[error("unknown target `{target}` for host `{host}`\navailable targets: {available}")]
    UnsupportedTarget {
        host: String,
        target: String,
        available: String,
    },

    #[error("no toolchain for `{triple}` on host `{host}`: {detail}")]
    ToolchainUnavailable {
        host: String,
        triple: String,
        detail: String,
    },

    #[error("build failed for target `{target}`:\n{diagnostic}")]
    BuildFailure { target: String, diagnostic: String },

    #[error("post-install failed for target `{target}` during {step}:\n{diagnostic}")]
    PostInstallFailure {
        target: String,
        step: String,
        diagnostic: String,
    },
}

impl Error {
    /// Whether this error invalidates the whole matrix evaluation rather
    /// than a single target.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedHost { .. } | Error::UnsupportedTarget { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_flagged() {
        let err = Error::UnsupportedHost {
            host: "mips-plan9".into(),
            available: "x86_64-linux".into(),
        };
        assert!(err.is_configuration_error());

        let err = Error::BuildFailure {
            target: "arm64-linux".into(),
            diagnostic: "linker not found".into(),
        };
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_build_failure_carries_diagnostic_verbatim() {
        let err = Error::BuildFailure {
            target: "x86_64-windows".into(),
            diagnostic: "undefined reference to `pthread_create'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("x86_64-windows"));
        assert!(msg.contains("undefined reference to `pthread_create'"));
    }
}
