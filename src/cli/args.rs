use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::JobName;

#[derive(Parser, Debug)]
#[command(
    name = "resticgen",
    version,
    about = "Compile restic backup jobs into systemd units, timers and wrappers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write units, timers, wrappers and data files
    Generate(GenerateArgs),
    /// Validate the configuration without writing anything
    Check,
    /// Print the resolved plan of each job
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub out: PathBuf,
    #[arg(long)]
    pub job: Vec<JobName>,
    /// Remove artifacts of jobs that are no longer configured
    #[arg(long, conflicts_with = "job")]
    pub prune_stale: bool,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    #[arg(long)]
    pub job: Vec<JobName>,
}
