//! Building one package for one resolved target.
//!
//! [`PackageBuilder`] merges the package template with a target's override,
//! invokes the compiler toolchain, and stages the produced binary into a
//! per-target install directory. The builder is oblivious to what the
//! package does; it only needs a name and a source root.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::builder::toolchain::ToolchainHandle;
use crate::core::package::{BuildOverride, BuiltArtifact, PackageTemplate, ResolvedPackage};
use crate::errors::{Error, Result};
use crate::util::fs::{absolutize, copy_dir_filtered, ensure_dir, make_executable, read_ignore_file};
use crate::util::process::ProcessBuilder;

/// Builds binaries out of a package template plus per-target overrides.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    cargo: PathBuf,
    out_dir: PathBuf,
}

impl PackageBuilder {
    /// Create a builder that stages artifacts under `out_dir`, one
    /// subdirectory per target name.
    ///
    /// The out dir is made absolute up front: install dirs end up inside
    /// published app entries, which must stay valid regardless of the
    /// consumer's working directory.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        PackageBuilder {
            cargo: which::which("cargo").unwrap_or_else(|_| PathBuf::from("cargo")),
            out_dir: absolutize(&out_dir.into()),
        }
    }

    /// Where a target's install directory lives.
    pub fn install_dir(&self, target: &str) -> PathBuf {
        self.out_dir.join(target)
    }

    /// Build the package for one target and stage the binary.
    ///
    /// Fails with [`Error::BuildFailure`] carrying the compiler/linker
    /// diagnostic verbatim.
    pub fn build(
        &self,
        template: &PackageTemplate,
        ov: &BuildOverride,
        toolchain: &ToolchainHandle,
        target: &str,
    ) -> Result<BuiltArtifact> {
        let pkg = template.merge(ov);

        let fail = |diagnostic: String| Error::BuildFailure {
            target: target.to_string(),
            diagnostic,
        };

        // Stage a filtered copy of the source tree when an ignore file is
        // configured; otherwise build in place.
        let staged;
        let build_root: &Path = match &pkg.ignore_file {
            Some(ignore) => {
                staged = self
                    .stage_sources(&pkg, ignore)
                    .map_err(|e| fail(format!("{e:#}")))?;
                staged.path()
            }
            None => &pkg.source_root,
        };

        if template.run_tests {
            self.cargo_invocation(&pkg, build_root)
                .arg("test")
                .exec_and_check()
                .map_err(|e| fail(format!("{e:#}")))?;
        }

        tracing::info!("building {} for {} ({})", pkg.name, target, pkg.triple);
        let mut cmd = self
            .cargo_invocation(&pkg, build_root)
            .args(["build", "--release", "--target", pkg.triple.as_str()]);
        if pkg.locked {
            cmd = cmd.arg("--locked");
        }

        let output = cmd.exec().map_err(|e| fail(format!("{e:#}")))?;
        if !output.status.success() {
            return Err(fail(format!(
                "`{}` exited with {:?}\n{}",
                cmd.display_command(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim_end()
            )));
        }

        let binary_name = pkg.binary_name();
        let built = build_root
            .join("target")
            .join(pkg.triple.as_str())
            .join("release")
            .join(&binary_name);
        if !built.exists() {
            return Err(fail(format!(
                "build succeeded but `{}` was not produced",
                built.display()
            )));
        }

        self.stage_artifact(&pkg, &built, &binary_name, target)
            .map_err(|e| fail(format!("{e:#}")))
    }

    /// Cargo process with the merged environment applied.
    ///
    /// Build inputs naming existing directories become linker search paths;
    /// the full list is exported as `SLIPWAY_BUILD_INPUTS` so build scripts
    /// can locate the extra build-time dependencies.
    fn cargo_invocation(&self, pkg: &ResolvedPackage, build_root: &Path) -> ProcessBuilder {
        let mut rustflags = pkg.rustflags.clone();
        for input in &pkg.build_inputs {
            if Path::new(input).is_dir() {
                rustflags.push("-L".to_string());
                rustflags.push(input.clone());
            }
        }

        let mut cmd = ProcessBuilder::new(&self.cargo)
            .cwd(build_root)
            .env("RUSTFLAGS", rustflags.join(" "))
            .envs(pkg.env.iter());
        if !pkg.build_inputs.is_empty() {
            cmd = cmd.env("SLIPWAY_BUILD_INPUTS", pkg.build_inputs.join(":"));
        }
        cmd
    }

    /// Copy the filtered source tree into a fresh staging directory.
    fn stage_sources(
        &self,
        pkg: &ResolvedPackage,
        ignore: &Path,
    ) -> anyhow::Result<tempfile::TempDir> {
        let patterns = read_ignore_file(ignore)?;
        let staged = tempfile::Builder::new()
            .prefix(&format!("slipway-src-{}-", pkg.name))
            .tempdir()
            .context("failed to create staging directory")?;
        copy_dir_filtered(&pkg.source_root, staged.path(), &patterns)
            .context("failed to stage sources")?;
        Ok(staged)
    }

    /// Move the binary into its install directory.
    fn stage_artifact(
        &self,
        pkg: &ResolvedPackage,
        built: &Path,
        binary_name: &str,
        target: &str,
    ) -> anyhow::Result<BuiltArtifact> {
        let install_dir = self.install_dir(target);
        ensure_dir(&install_dir)?;

        let dest = install_dir.join(binary_name);
        std::fs::copy(built, &dest).with_context(|| {
            format!("failed to install {} to {}", built.display(), dest.display())
        })?;
        make_executable(&dest)?;

        Ok(BuiltArtifact {
            package: pkg.name.clone(),
            target: target.to_string(),
            triple: pkg.triple.clone(),
            install_dir,
            binary_name: binary_name.to_string(),
            exe_subpath: None,
        })
    }
}
