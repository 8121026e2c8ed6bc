//! Patch validation command.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use trivox_config::Patch;

#[derive(Args)]
pub struct CheckArgs {
    /// Patch file to validate
    #[arg(value_name = "PATCH")]
    patch: PathBuf,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let patch = Patch::load(&args.patch)
        .with_context(|| format!("failed to load patch {}", args.patch.display()))?;
    let problems = patch.problems();

    let label = patch
        .name
        .clone()
        .unwrap_or_else(|| args.patch.display().to_string());
    if problems.is_empty() {
        println!("{label}: ok ({} parameters)", patch.params.len());
        return Ok(());
    }

    for problem in &problems {
        println!("{label}: {problem}");
    }
    bail!("{} problem(s) in {}", problems.len(), args.patch.display());
}
