//! `slipway build` command

use anyhow::{bail, Context, Result};

use crate::cli::BuildArgs;
use slipway::core::host::BuildHost;
use slipway::core::package::PackageTemplate;
use slipway::builder::executor::TargetOutcome;
use slipway::ops::release::{plan, release, ReleaseOptions};

pub fn execute(args: BuildArgs, verbose: bool) -> Result<()> {
    let matrix = super::load_matrix(args.matrix.as_deref())?;

    let host = match &args.host {
        Some(raw) => Some(raw.parse::<BuildHost>()?),
        None => None,
    };

    let source = slipway::util::fs::normalize_path(&args.source);
    let name = match args.name {
        Some(name) => name,
        None => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("cannot infer package name from source directory; pass --name")?,
    };

    let mut template = PackageTemplate::new(name, &source);
    if let Some(ignore) = args.ignore_file {
        template = template.with_ignore_file(ignore);
    }
    if args.no_locked {
        template.locked = false;
    }

    if args.plan {
        let host = host.unwrap_or_else(BuildHost::detect);
        let rows = plan(&template, &matrix, &host, &args.target)?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let opts = ReleaseOptions {
        host,
        targets: args.target,
        jobs: args.jobs,
        out_dir: args.out,
        verbose,
    };

    let result = release(&template, &matrix, &opts)?;

    for report in &result.reports {
        match &report.outcome {
            TargetOutcome::Success { artifact, bundle, app } => {
                // Publish the app entry next to the artifact for external
                // invocation drivers.
                std::fs::write(
                    artifact.install_dir.join("app.json"),
                    serde_json::to_string_pretty(app)?,
                )?;
                eprintln!(
                    "    Packaged {} ({}) -> {}",
                    report.target,
                    report.triple,
                    bundle.tgz.display()
                );
            }
            TargetOutcome::Failed { error } => {
                eprintln!("      Failed {}: {}", report.target, error);
            }
        }
    }

    let failed = result.failed_count();
    if failed > 0 {
        bail!("{failed} target(s) failed");
    }
    Ok(())
}
