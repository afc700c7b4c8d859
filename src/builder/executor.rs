//! Matrix executor with progress reporting.
//!
//! Each (host, target) build is an independent unit of work: no shared
//! mutable state beyond the read-only template and matrix, so units run on
//! a rayon worker pool with no ordering between targets. Within one
//! target, steps stay strictly sequential (toolchain -> build ->
//! post-install). A target's failure is recorded in its report and never
//! halts siblings; only configuration-shape errors abort the whole run,
//! and those are detected before any work starts.

use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::builder::package::PackageBuilder;
use crate::builder::toolchain::ToolchainResolver;
use crate::core::app::{expose, AppEntry};
use crate::core::host::BuildHost;
use crate::core::package::{BuiltArtifact, PackageTemplate};
use crate::core::target::TargetSpec;
use crate::core::triple::TargetTriple;
use crate::errors::Error;
use crate::matrix::TargetMatrix;
use crate::postinstall::{PostInstallPipeline, ReleaseBundle};

/// Outcome of one target's build + post-install pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TargetOutcome {
    Success {
        artifact: BuiltArtifact,
        bundle: ReleaseBundle,
        app: AppEntry,
    },
    Failed {
        error: String,
    },
}

/// Per-target result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: String,
    pub triple: TargetTriple,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
}

impl TargetReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TargetOutcome::Success { .. })
    }
}

/// Runs the matrix for one host.
pub struct MatrixExecutor<'a> {
    matrix: &'a TargetMatrix,
    template: &'a PackageTemplate,
    resolver: ToolchainResolver,
    builder: PackageBuilder,
    verbose: bool,
}

impl<'a> MatrixExecutor<'a> {
    /// Create an executor staging artifacts under `out_dir`.
    pub fn new(
        matrix: &'a TargetMatrix,
        template: &'a PackageTemplate,
        out_dir: impl Into<std::path::PathBuf>,
    ) -> Self {
        MatrixExecutor {
            matrix,
            template,
            resolver: ToolchainResolver::new(),
            builder: PackageBuilder::new(out_dir),
            verbose: false,
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Build the selected targets (all of the host's targets when `targets`
    /// is empty) and run each one's post-install pipeline.
    ///
    /// Unknown hosts or target names fail here, before any toolchain
    /// resolution or process spawn.
    pub fn execute(
        &self,
        host: &BuildHost,
        targets: &[String],
        jobs: Option<usize>,
    ) -> Result<Vec<TargetReport>> {
        let start = Instant::now();
        let selected = self.select_targets(host, targets)?;

        let pb = if !self.verbose && selected.len() > 1 {
            let pb = ProgressBar::new(selected.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let run = || {
            selected
                .par_iter()
                .map(|(name, spec)| {
                    let report = self.run_target(host, name, spec);
                    if let Some(ref pb) = pb {
                        pb.inc(1);
                    }
                    report
                })
                .collect::<Vec<_>>()
        };

        let reports = match jobs {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("failed to create worker pool")?
                .install(run),
            None => run(),
        };

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        let built = reports.iter().filter(|r| r.is_success()).count();
        eprintln!(
            "    Finished {}/{} target(s) in {:.2}s",
            built,
            reports.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(reports)
    }

    /// Validate the host and every requested target name eagerly.
    fn select_targets(
        &self,
        host: &BuildHost,
        targets: &[String],
    ) -> Result<Vec<(String, TargetSpec)>, Error> {
        let table = self.matrix.lookup(host)?;

        if targets.is_empty() {
            return Ok(table
                .iter()
                .map(|(name, spec)| (name.clone(), spec.clone()))
                .collect());
        }

        targets
            .iter()
            .map(|name| {
                self.matrix
                    .spec(host, name)
                    .map(|spec| (name.clone(), spec.clone()))
            })
            .collect()
    }

    /// One target's full pipeline: toolchain -> override -> build ->
    /// post-install -> app entry.
    fn run_target(&self, host: &BuildHost, name: &str, spec: &TargetSpec) -> TargetReport {
        if self.verbose {
            eprintln!("   Compiling {} ({})", name, spec.triple);
        }

        let result: Result<_, Error> = (|| {
            let toolchain = self.resolver.resolve(host, &spec.triple)?;
            let ov = self.matrix.resolve_override(host, name, &toolchain)?;
            let artifact = self.builder.build(self.template, &ov, &toolchain, name)?;
            let bundle = PostInstallPipeline::new(ov.strategy.clone()).run(&artifact)?;
            Ok((artifact, bundle))
        })();

        let outcome = match result {
            Ok((artifact, bundle)) => {
                let app = expose(&artifact);
                TargetOutcome::Success {
                    artifact,
                    bundle,
                    app,
                }
            }
            Err(e) => {
                tracing::warn!("target {name} failed: {e}");
                TargetOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        TargetReport {
            target: name.to_string(),
            triple: spec.triple.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_matrix() -> TargetMatrix {
        let mut matrix = TargetMatrix::new();
        matrix.entry(BuildHost::new("x86_64", "linux")).extend([(
            "x86_64-linux".to_string(),
            TargetSpec::native("x86_64-unknown-linux-musl"),
        )]);
        matrix
    }

    #[test]
    fn test_unknown_target_fails_before_any_work() {
        let tmp = tempfile::TempDir::new().unwrap();
        let matrix = minimal_matrix();
        // A source root that does not exist: any attempt to build would
        // fail loudly, so reaching the build step would flip this test.
        let template = PackageTemplate::new("ghost", "/nonexistent/ghost");
        let executor = MatrixExecutor::new(&matrix, &template, tmp.path());

        let err = executor
            .execute(
                &BuildHost::new("x86_64", "linux"),
                &["riscv64-linux".to_string()],
                None,
            )
            .unwrap_err();

        let err = err.downcast_ref::<Error>().unwrap();
        assert!(matches!(err, Error::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_unknown_host_fails_whole_run() {
        let tmp = tempfile::TempDir::new().unwrap();
        let matrix = minimal_matrix();
        let template = PackageTemplate::new("ghost", "/nonexistent/ghost");
        let executor = MatrixExecutor::new(&matrix, &template, tmp.path());

        let err = executor
            .execute(&BuildHost::new("s390x", "linux"), &[], None)
            .unwrap_err();
        let err = err.downcast_ref::<Error>().unwrap();
        assert!(matches!(err, Error::UnsupportedHost { .. }));
    }

    #[test]
    fn test_per_target_failure_is_isolated() {
        // Two targets whose toolchains cannot exist: both fail, neither
        // aborts the run, and each failure is reported separately.
        let tmp = tempfile::TempDir::new().unwrap();
        let mut matrix = TargetMatrix::new();
        matrix.entry(BuildHost::new("x86_64", "linux")).extend([
            (
                "weird-a".to_string(),
                TargetSpec::emulated("sparc64-unknown-openbsd-musl", "qemu-sparc64"),
            ),
            (
                "weird-b".to_string(),
                TargetSpec::emulated("m68k-unknown-haiku-musl", "qemu-m68k"),
            ),
        ]);
        let template = PackageTemplate::new("ghost", "/nonexistent/ghost");
        let executor = MatrixExecutor::new(&matrix, &template, tmp.path());

        let reports = executor
            .execute(&BuildHost::new("x86_64", "linux"), &[], None)
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| !r.is_success()));
        for report in &reports {
            match &report.outcome {
                TargetOutcome::Failed { error } => {
                    assert!(error.contains("no toolchain"), "error: {error}")
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }
}
