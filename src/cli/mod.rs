use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{check, exit_for_error, generate, show};
use crate::types::RunMode;

const CONFIG_FILE: &str = "/etc/resticgen.yaml";

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let result = match cli.command {
        Command::Generate(args) => {
            let run_mode = RunMode {
                dry_run: args.dry_run,
                verbose: cli.verbose,
            };
            generate::run_generate(&config_path, &args, run_mode)
        }
        Command::Check => check::run_check(&config_path),
        Command::Show(args) => show::run_show(&config_path, &args),
    };
    if let Err(err) = result {
        exit_for_error(&err);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
