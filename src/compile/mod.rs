//! Compilation of job configurations into unit, timer and wrapper
//! descriptors. Nothing in here touches the filesystem.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{Config, JobConfig};
use crate::error::{JobError, JobErrors, Result, ResticgenError};

pub mod command;
pub mod environment;
pub mod pipeline;
pub mod resolve;
pub mod timer;
pub mod unit;
pub mod wrapper;

pub use environment::{compose, Environment};
pub use pipeline::{build_pipeline, Pipeline, SideFile};
pub use resolve::{resolve_job, Job};
pub use timer::{synthesize_timer, TimerUnit};
pub use unit::{synthesize_unit, ServiceUnit};
pub use wrapper::{synthesize_wrapper, Wrapper};

pub const DEFAULT_RESTIC_PACKAGE: &str = "/usr/bin/restic";
pub const DEFAULT_INHIBIT_PACKAGE: &str = "/usr/bin/systemd-inhibit";
pub const DEFAULT_DATA_DIR: &str = "/etc/resticgen";

/// Configuration-set wide facts a single job is resolved against.
#[derive(Debug, Clone)]
pub struct CompileContext {
    pub job_names: BTreeSet<String>,
    pub restic_package: PathBuf,
    pub inhibit_package: PathBuf,
    pub data_dir: PathBuf,
    pub search_path: Vec<String>,
}

impl CompileContext {
    pub fn new(cfg: &Config) -> Self {
        let options = &cfg.options;
        Self {
            job_names: cfg.jobs.keys().cloned().collect(),
            restic_package: options
                .restic_package
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESTIC_PACKAGE)),
            inhibit_package: options
                .inhibit_package
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INHIBIT_PACKAGE)),
            data_dir: options
                .data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            search_path: options.search_path.clone(),
        }
    }
}

/// Everything generated for one job.
#[derive(Debug, Clone)]
pub struct JobArtifacts {
    pub job: Job,
    pub unit: ServiceUnit,
    pub timer: Option<TimerUnit>,
    pub wrapper: Option<Wrapper>,
    pub side_files: Vec<SideFile>,
}

pub fn compile_job(
    ctx: &CompileContext,
    name: &str,
    raw: &JobConfig,
) -> std::result::Result<JobArtifacts, Vec<JobError>> {
    let job = resolve_job(ctx, name, raw)?;
    let pipeline = build_pipeline(&job);
    let environment = compose(&job.settings, &job.rclone_settings);
    let unit = synthesize_unit(&job, environment, &pipeline);
    let timer = synthesize_timer(&job);
    let wrapper = synthesize_wrapper(&job);
    debug!(
        job = %job.name,
        exec_start = unit.exec_start.len(),
        timer = timer.is_some(),
        wrapper = wrapper.is_some(),
        "compiled job"
    );
    Ok(JobArtifacts {
        job,
        unit,
        timer,
        wrapper,
        side_files: pipeline.side_files,
    })
}

/// Compile every job in the configuration set, returning the selected
/// ones. All jobs are validated even when only some are selected; any
/// error fails the whole set.
pub fn compile_config(cfg: &Config, selected: &[String]) -> Result<Vec<JobArtifacts>> {
    for name in selected {
        if !cfg.jobs.contains_key(name) {
            return Err(ResticgenError::message(format!("job not found: {}", name)));
        }
    }
    let ctx = CompileContext::new(cfg);
    let mut compiled = Vec::new();
    let mut errors = Vec::new();
    for (name, raw) in &cfg.jobs {
        match compile_job(&ctx, name, raw) {
            Ok(artifacts) => compiled.push(artifacts),
            Err(errs) => errors.extend(errs),
        }
    }
    if !errors.is_empty() {
        return Err(JobErrors(errors).into());
    }
    if !selected.is_empty() {
        compiled.retain(|a| selected.iter().any(|s| s == &a.job.name));
    }
    Ok(compiled)
}
