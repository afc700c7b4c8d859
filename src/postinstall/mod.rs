//! Post-install pipeline: raw binary -> release bundle.
//!
//! The pipeline runs a fixed sequence from the artifact's install
//! directory: create the generated-artifact directories, invoke the
//! binary's self-documentation subcommand to emit a manual-page tree,
//! invoke its completion subcommand once per supported shell, then archive
//! everything. The binary may only be runnable through an emulator or
//! compatibility runtime; the configured [`ExecStrategy`] supplies the
//! invocation prefix and, for compatibility runtimes, an isolated
//! environment directory that is created fresh per pipeline run and torn
//! down when the run ends, successfully or not.
//!
//! Any step failure aborts this target's pipeline; sibling targets are
//! unaffected.

pub mod archive;
pub mod emulation;

use std::path::PathBuf;

use anyhow::Context;
use tempfile::TempDir;

use crate::core::package::BuiltArtifact;
use crate::errors::{Error, Result};
use crate::postinstall::emulation::ExecStrategy;
use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Shell families for which a completion script is generated, one file per
/// shell under `completions/`.
pub const COMPLETION_SHELLS: [&str; 5] = ["bash", "elvish", "fish", "powershell", "zsh"];

/// Subcommand that writes a manual-page tree to a directory.
const MAN_SUBCOMMAND: &str = "man";
/// Subcommand that writes a completion script for a shell to stdout.
const COMPLETION_SUBCOMMAND: &str = "completion";

/// Paths of everything the pipeline produced for one target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReleaseBundle {
    pub man_dir: PathBuf,
    pub completions_dir: PathBuf,
    pub tgz: PathBuf,
    pub zip: PathBuf,
    pub checksums: PathBuf,
}

/// Turns a built binary into a release bundle.
#[derive(Debug, Clone)]
pub struct PostInstallPipeline {
    strategy: ExecStrategy,
}

impl PostInstallPipeline {
    pub fn new(strategy: ExecStrategy) -> Self {
        PostInstallPipeline { strategy }
    }

    /// Run the full pipeline for one artifact.
    pub fn run(&self, artifact: &BuiltArtifact) -> Result<ReleaseBundle> {
        let step = |name: &str, e: anyhow::Error| Error::PostInstallFailure {
            target: artifact.target.clone(),
            step: name.to_string(),
            diagnostic: format!("{e:#}"),
        };

        // Exclusively owned by this run; dropped (deleted) on any exit.
        let isolation = match self.strategy.isolation_env_var() {
            Some(_) => Some(fresh_isolation_dir().map_err(|e| step("emulation setup", e))?),
            None => None,
        };

        let man_dir = artifact.install_dir.join("man");
        let completions_dir = artifact.install_dir.join("completions");
        ensure_dir(&man_dir).map_err(|e| step("directory setup", e))?;
        ensure_dir(&completions_dir).map_err(|e| step("directory setup", e))?;

        tracing::debug!(
            "generating man pages for {} via `{}`",
            artifact.target,
            self.binary_cmd(artifact, &isolation)
                .arg(MAN_SUBCOMMAND)
                .display_command()
        );
        self.binary_cmd(artifact, &isolation)
            .args([MAN_SUBCOMMAND, "man"])
            .exec_and_check()
            .map_err(|e| step("man generation", e))?;

        for shell in COMPLETION_SHELLS {
            let script = self
                .binary_cmd(artifact, &isolation)
                .args([COMPLETION_SUBCOMMAND, shell])
                .capture_stdout()
                .map_err(|e| step(&format!("{shell} completion"), e))?;
            std::fs::write(completions_dir.join(shell), script)
                .with_context(|| format!("failed to write {shell} completion"))
                .map_err(|e| step(&format!("{shell} completion"), e))?;
        }

        let tgz = archive::write_tgz(artifact).map_err(|e| step("tar archive", e))?;
        let zip = archive::write_zip(artifact).map_err(|e| step("zip archive", e))?;
        let checksums = archive::write_checksums(artifact, &[&tgz, &zip])
            .map_err(|e| step("checksums", e))?;

        Ok(ReleaseBundle {
            man_dir,
            completions_dir,
            tgz,
            zip,
            checksums,
        })
    }

    /// An invocation of the built binary, wrapped per the execution
    /// strategy and run from the install directory.
    fn binary_cmd(&self, artifact: &BuiltArtifact, isolation: &Option<TempDir>) -> ProcessBuilder {
        let mut pb = ProcessBuilder::wrapped(&self.strategy.prefix(), artifact.binary_path())
            .cwd(&artifact.install_dir);
        if let (Some(var), Some(dir)) = (self.strategy.isolation_env_var(), isolation) {
            pb = pb.env(var, dir.path().to_string_lossy());
        }
        pb
    }
}

/// A freshly created, empty environment directory for a compatibility
/// runtime. State from one target build never leaks into another.
pub fn fresh_isolation_dir() -> anyhow::Result<TempDir> {
    tempfile::Builder::new()
        .prefix("slipway-env-")
        .tempdir()
        .context("failed to create isolated environment directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_shells() {
        assert_eq!(
            COMPLETION_SHELLS,
            ["bash", "elvish", "fish", "powershell", "zsh"]
        );
    }

    #[test]
    fn test_isolation_dirs_are_fresh_and_distinct() {
        let a = fresh_isolation_dir().unwrap();
        let b = fresh_isolation_dir().unwrap();
        assert_ne!(a.path(), b.path());
        assert!(std::fs::read_dir(a.path()).unwrap().next().is_none());

        let path = a.path().to_path_buf();
        drop(a);
        assert!(!path.exists());
    }

    #[test]
    fn test_wrapped_invocation_carries_isolation_env() {
        let strategy = ExecStrategy::OsCompatibility {
            runtime: "wine".into(),
        };
        let pipeline = PostInstallPipeline::new(strategy);
        let tmp = tempfile::TempDir::new().unwrap();
        let artifact = crate::core::package::BuiltArtifact {
            package: "mailsync".into(),
            target: "x86_64-windows".into(),
            triple: crate::core::triple::TargetTriple::new("x86_64-pc-windows-gnu"),
            install_dir: tmp.path().to_path_buf(),
            binary_name: "mailsync.exe".into(),
            exe_subpath: None,
        };

        let isolation = Some(fresh_isolation_dir().unwrap());
        let cmd = pipeline.binary_cmd(&artifact, &isolation);
        assert_eq!(cmd.get_program(), std::path::Path::new("wine"));
        assert!(cmd.get_args()[0].ends_with("mailsync.exe"));
    }
}
