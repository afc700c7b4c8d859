//! `slipway targets` command

use anyhow::Result;

use crate::cli::TargetsArgs;
use slipway::core::host::BuildHost;
use slipway::core::target::TargetKind;
use slipway::matrix::TargetMatrix;

pub fn execute(args: TargetsArgs) -> Result<()> {
    let matrix = super::load_matrix(args.matrix.as_deref())?;

    match &args.host {
        Some(raw) => {
            let host = raw.parse::<BuildHost>()?;
            print_row(&matrix, &host)?;
        }
        None => {
            for host in matrix.hosts().cloned().collect::<Vec<_>>() {
                print_row(&matrix, &host)?;
            }
        }
    }
    Ok(())
}

fn print_row(matrix: &TargetMatrix, host: &BuildHost) -> Result<()> {
    println!("{host}:");
    for (name, spec) in matrix.lookup(host)? {
        println!("  {name} -> {} [{}]", spec.triple, describe(&spec.kind));
    }
    Ok(())
}

fn describe(kind: &TargetKind) -> String {
    match kind {
        TargetKind::Native => "native".to_string(),
        TargetKind::CpuEmulation { emulator } => format!("cpu-emulation via {emulator}"),
        TargetKind::OsCompatibility { runtime, .. } => {
            format!("os-compatibility via {runtime}")
        }
    }
}
