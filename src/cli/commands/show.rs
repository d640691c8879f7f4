use std::path::Path;

use crate::cli::args::ShowArgs;
use crate::cli::commands::selected;
use crate::compile::{compile_config, JobArtifacts};
use crate::config::load_config;
use crate::error::Result;
use crate::render::{shell, systemd};

pub fn run_show(config_path: &Path, args: &ShowArgs) -> Result<()> {
    let cfg = load_config(config_path)?;
    for artifacts in compile_config(&cfg, &selected(&args.job))? {
        print_job_details(&artifacts);
    }
    Ok(())
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn print_job_details(artifacts: &JobArtifacts) {
    let job = &artifacts.job;
    let unit = &artifacts.unit;
    println!("job: {}", job.name);
    println!("  unit: {}", unit.file_name());
    match &artifacts.timer {
        Some(timer) => {
            let fields: Vec<String> = timer
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("  timer: {} ({})", timer.file_name(), fields.join(", "));
        }
        None => println!("  timer: <manual>"),
    }
    match &artifacts.wrapper {
        Some(wrapper) => println!("  wrapper: {}", wrapper.name),
        None => println!("  wrapper: <none>"),
    }
    println!("  user: {}", job.user);
    println!(
        "  paths: {}",
        list_or(job.paths.as_deref().unwrap_or_default(), "<none>")
    );
    println!("  excludes: {}", list_or(&job.exclude, "<none>"));
    println!("  file list: {}", job.files_from.display());
    if let Some(file) = &unit.environment_file {
        println!("  environment file: {}", file);
    }
    println!("  environment:");
    for (key, value) in unit.environment.iter() {
        println!("    {}={}", key, value);
    }
    match &unit.pre_start {
        Some(script) => {
            println!("  prepare:");
            for step in &script.steps {
                println!("    {}", shell::step(step));
            }
        }
        None => println!("  prepare: <none>"),
    }
    if unit.exec_start.is_empty() {
        println!("  main: <none>");
    } else {
        println!("  main:");
        for cmd in &unit.exec_start {
            println!("    {}", systemd::exec_line(cmd));
        }
    }
    match &unit.post_stop {
        Some(script) => {
            println!("  cleanup:");
            for step in &script.steps {
                println!("    {}", shell::step(step));
            }
        }
        None => println!("  cleanup: <none>"),
    }
}
