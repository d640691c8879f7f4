use std::path::Path;

use crate::compile::compile_config;
use crate::config::load_config;
use crate::error::Result;

pub fn run_check(config_path: &Path) -> Result<()> {
    let cfg = load_config(config_path)?;
    let artifacts = compile_config(&cfg, &[])?;
    let timers = artifacts.iter().filter(|a| a.timer.is_some()).count();
    let wrappers = artifacts.iter().filter(|a| a.wrapper.is_some()).count();
    println!(
        "{}: {} job(s) ok, {} timer(s), {} wrapper(s)",
        config_path.display(),
        artifacts.len(),
        timers,
        wrappers
    );
    Ok(())
}
