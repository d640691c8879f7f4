use std::path::Path;

use tracing::info;

use crate::cli::args::GenerateArgs;
use crate::cli::commands::selected;
use crate::compile::compile_config;
use crate::config::load_config;
use crate::error::Result;
use crate::output::{plan, prune_stale, write_tree};
use crate::types::RunMode;

pub fn run_generate(config_path: &Path, args: &GenerateArgs, run_mode: RunMode) -> Result<()> {
    let cfg = load_config(config_path)?;
    let artifacts = compile_config(&cfg, &selected(&args.job))?;
    let files = plan(&artifacts);
    if run_mode.verbose {
        println!(
            "compiled {} job(s) from {} into {} file(s)",
            artifacts.len(),
            config_path.display(),
            files.len()
        );
    }

    let changed = write_tree(&args.out, &files, run_mode)?;
    let removed = if args.prune_stale {
        prune_stale(&args.out, &files, run_mode)?
    } else {
        Vec::new()
    };
    info!(
        jobs = artifacts.len(),
        changed,
        removed = removed.len(),
        out = %args.out.display(),
        "generate finished"
    );
    Ok(())
}
