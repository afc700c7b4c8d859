//! `slipway apps` command
//!
//! Prints the app entries published by a previous `slipway build`, one
//! JSON object per line, for consumption by an external invocation driver.

use anyhow::{Context, Result};

use crate::cli::AppsArgs;
use slipway::core::app::AppEntry;

pub fn execute(args: AppsArgs) -> Result<()> {
    let entries = std::fs::read_dir(&args.out)
        .with_context(|| format!("failed to read output directory: {}", args.out.display()))?;

    for entry in entries {
        let entry = entry?;
        let app_json = entry.path().join("app.json");
        if !app_json.is_file() {
            continue;
        }
        let raw = std::fs::read_to_string(&app_json)?;
        let app: AppEntry = serde_json::from_str(&raw)
            .with_context(|| format!("invalid app entry: {}", app_json.display()))?;
        println!("{}", serde_json::to_string(&app)?);
    }
    Ok(())
}
