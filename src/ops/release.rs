//! Implementation of `slipway build`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::builder::executor::{MatrixExecutor, TargetReport};
use crate::core::host::BuildHost;
use crate::core::package::PackageTemplate;
use crate::core::target::TargetKind;
use crate::core::triple::TargetTriple;
use crate::matrix::TargetMatrix;

/// Options for the release operation.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Build host (detected when unset).
    pub host: Option<BuildHost>,

    /// Specific targets to build (empty = the host's full matrix row).
    pub targets: Vec<String>,

    /// Number of parallel target builds.
    pub jobs: Option<usize>,

    /// Directory receiving one install dir per target.
    pub out_dir: PathBuf,

    /// Verbose output.
    pub verbose: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        ReleaseOptions {
            host: None,
            targets: Vec::new(),
            jobs: None,
            out_dir: PathBuf::from("dist"),
            verbose: false,
        }
    }
}

/// Result of a release run.
#[derive(Debug)]
pub struct ReleaseResult {
    pub host: BuildHost,
    pub reports: Vec<TargetReport>,
}

impl ReleaseResult {
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_success()).count()
    }
}

/// Build every selected target for the host and run each post-install
/// pipeline. Per-target failures are collected in the reports; only
/// configuration-shape errors abort the run.
pub fn release(
    template: &PackageTemplate,
    matrix: &TargetMatrix,
    opts: &ReleaseOptions,
) -> Result<ReleaseResult> {
    let host = opts.host.clone().unwrap_or_else(BuildHost::detect);
    tracing::info!("building {} for host {host}", template.name);

    let executor = MatrixExecutor::new(matrix, template, &opts.out_dir).verbose(opts.verbose);
    let reports = executor.execute(&host, &opts.targets, opts.jobs)?;

    Ok(ReleaseResult { host, reports })
}

/// One row of the build plan: everything decided about a target before
/// any toolchain resolution or process spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetPlan {
    pub target: String,
    pub triple: TargetTriple,
    #[serde(flatten)]
    pub kind: TargetKind,
    /// Invocation prefix the post-install pipeline would use.
    pub exec_prefix: Vec<String>,
    pub binary_name: String,
}

/// Compute the build plan for the selected targets without building.
pub fn plan(
    template: &PackageTemplate,
    matrix: &TargetMatrix,
    host: &BuildHost,
    targets: &[String],
) -> Result<Vec<TargetPlan>> {
    let table = matrix.lookup(host)?;

    let names: Vec<String> = if targets.is_empty() {
        table.keys().cloned().collect()
    } else {
        targets.to_vec()
    };

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let spec = matrix.spec(host, &name)?;
        rows.push(TargetPlan {
            target: name,
            triple: spec.triple.clone(),
            kind: spec.kind.clone(),
            exec_prefix: spec.kind.exec_strategy().prefix(),
            binary_name: format!("{}{}", template.name, spec.triple.exe_suffix()),
        });
    }
    Ok(rows)
}
