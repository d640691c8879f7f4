//! Installs compiled artifacts into an output tree:
//!
//! ```text
//! <out>/units/restic-backups-<job>.service
//! <out>/units/restic-backups-<job>.timer
//! <out>/bin/restic-<job>
//! <out>/data/<job>/...        staged copy of the job's data dir
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::compile::pipeline::{
    CLEANUP_COMMAND, DYNAMIC_FILES_FROM, EXCLUDE_PATTERNS, PREPARE_COMMAND, STATIC_PATHS,
};
use crate::compile::unit::{PhaseScript, POST_STOP, PRE_START};
use crate::compile::JobArtifacts;
use crate::error::{Result, ResticgenError};
use crate::render::{shell, systemd, GENERATED_MARKER};
use crate::types::RunMode;
use crate::util::paths::ensure_dir;

pub const UNITS_DIR: &str = "units";
pub const BIN_DIR: &str = "bin";
pub const DATA_DIR: &str = "data";

const DATA_FILE_NAMES: [&str; 7] = [
    EXCLUDE_PATTERNS,
    STATIC_PATHS,
    PREPARE_COMMAND,
    CLEANUP_COMMAND,
    DYNAMIC_FILES_FROM,
    PRE_START,
    POST_STOP,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
    pub mode: u32,
}

fn data_path(job: &str, installed: &Path) -> PathBuf {
    let file_name = installed
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default();
    Path::new(DATA_DIR).join(job).join(file_name)
}

fn phase_file(job: &str, script: &PhaseScript) -> OutputFile {
    OutputFile {
        path: data_path(job, &script.path),
        contents: shell::phase_script(script),
        mode: 0o755,
    }
}

/// Every file the given jobs produce, in a stable order.
pub fn plan(artifacts: &[JobArtifacts]) -> Vec<OutputFile> {
    let mut files = Vec::new();
    for a in artifacts {
        let job = a.job.name.as_str();
        files.push(OutputFile {
            path: Path::new(UNITS_DIR).join(a.unit.file_name()),
            contents: systemd::service_unit(&a.unit),
            mode: 0o644,
        });
        if let Some(timer) = &a.timer {
            files.push(OutputFile {
                path: Path::new(UNITS_DIR).join(timer.file_name()),
                contents: systemd::timer_unit(timer),
                mode: 0o644,
            });
        }
        if let Some(wrapper) = &a.wrapper {
            files.push(OutputFile {
                path: Path::new(BIN_DIR).join(&wrapper.name),
                contents: shell::wrapper_script(wrapper),
                mode: 0o755,
            });
        }
        if let Some(script) = &a.unit.pre_start {
            files.push(phase_file(job, script));
        }
        if let Some(script) = &a.unit.post_stop {
            files.push(phase_file(job, script));
        }
        for side in &a.side_files {
            files.push(OutputFile {
                path: data_path(job, &side.path),
                contents: side.contents.clone(),
                mode: if side.executable { 0o755 } else { 0o644 },
            });
        }
    }
    files
}

fn write_atomic(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| ResticgenError::message(format!("{} has no parent", path.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| ResticgenError::message(format!("create temp in {}: {}", dir.display(), e)))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| ResticgenError::message(format!("write {}: {}", path.display(), e)))?;
    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))
        .map_err(|e| ResticgenError::message(format!("chmod {}: {}", path.display(), e)))?;
    tmp.persist(path)
        .map_err(|e| ResticgenError::message(format!("rename {}: {}", path.display(), e)))?;
    Ok(())
}

fn is_current(path: &Path, file: &OutputFile) -> bool {
    match (fs::read_to_string(path), fs::metadata(path)) {
        (Ok(existing), Ok(meta)) => {
            existing == file.contents && meta.permissions().mode() & 0o777 == file.mode
        }
        _ => false,
    }
}

/// Write `files` below `out`. Returns how many files changed.
pub fn write_tree(out: &Path, files: &[OutputFile], run_mode: RunMode) -> Result<usize> {
    let mut changed = 0;
    for file in files {
        let target = out.join(&file.path);
        if is_current(&target, file) {
            debug!(path = %target.display(), "unchanged");
            continue;
        }
        changed += 1;
        if run_mode.dry_run {
            println!("dry-run: write {}", target.display());
            continue;
        }
        if let Some(parent) = target.parent() {
            ensure_dir(parent, 0o755)?;
        }
        write_atomic(&target, &file.contents, file.mode)?;
        info!(path = %target.display(), "wrote");
    }
    Ok(changed)
}

fn is_generated(path: &Path, rel: &Path) -> bool {
    if rel.starts_with(DATA_DIR) {
        let name = rel.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        return rel.components().count() == 3 && DATA_FILE_NAMES.contains(&name);
    }
    match fs::read_to_string(path) {
        Ok(contents) => contents.lines().take(2).any(|l| l == GENERATED_MARKER),
        Err(_) => false,
    }
}

/// Remove generated files under `out` that are not part of `keep`.
pub fn prune_stale(out: &Path, keep: &[OutputFile], run_mode: RunMode) -> Result<Vec<PathBuf>> {
    let keep: HashSet<&Path> = keep.iter().map(|f| f.path.as_path()).collect();
    let mut removed = Vec::new();
    for sub in [UNITS_DIR, BIN_DIR, DATA_DIR] {
        let root = out.join(sub);
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = entry.map_err(|e| {
                ResticgenError::message(format!("walk {}: {}", root.display(), e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let rel = path.strip_prefix(out).unwrap_or(path);
            if keep.contains(rel) || !is_generated(path, rel) {
                continue;
            }
            if run_mode.dry_run {
                println!("dry-run: rm {}", path.display());
            } else {
                fs::remove_file(path)
                    .map_err(|e| ResticgenError::message(format!("rm {}: {}", path.display(), e)))?;
                info!(path = %path.display(), "removed stale artifact");
            }
            removed.push(rel.to_path_buf());
        }
    }
    if !run_mode.dry_run {
        remove_empty_job_dirs(&out.join(DATA_DIR))?;
    }
    Ok(removed)
}

fn remove_empty_job_dirs(data: &Path) -> Result<()> {
    if !data.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(data).min_depth(1).max_depth(1) {
        let entry =
            entry.map_err(|e| ResticgenError::message(format!("walk {}: {}", data.display(), e)))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let empty = fs::read_dir(entry.path())
            .map(|mut it| it.next().is_none())
            .unwrap_or(false);
        if empty {
            fs::remove_dir(entry.path()).map_err(|e| {
                ResticgenError::message(format!("rmdir {}: {}", entry.path().display(), e))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_config;
    use crate::config::parse_config;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
jobs:
  home:
    paths: ["/home"]
    exclude: ["/home/*/.cache"]
    settings: { RESTIC_REPOSITORY: "/mnt/backup" }
  prune:
    settings: { RESTIC_REPOSITORY: "/mnt/backup" }
    pruneOpts: ["--keep-daily 7"]
    timerConfig: null
    createWrapper: false
"#;

    fn planned(yaml: &str) -> Vec<OutputFile> {
        let cfg = parse_config(yaml).expect("parse");
        plan(&compile_config(&cfg, &[]).expect("compile"))
    }

    #[test]
    fn plan_lists_units_wrappers_and_data() {
        let files = planned(CONFIG);
        let paths: Vec<String> = files
            .iter()
            .map(|f| f.path.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "units/restic-backups-home.service",
                "units/restic-backups-home.timer",
                "bin/restic-home",
                "data/home/pre-start",
                "data/home/post-stop",
                "data/home/static-paths",
                "data/home/exclude-patterns",
                "units/restic-backups-prune.service",
            ]
        );
        let wrapper = files.iter().find(|f| f.path.ends_with("restic-home")).expect("wrapper");
        assert_eq!(wrapper.mode, 0o755);
    }

    #[test]
    fn write_tree_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let files = planned(CONFIG);
        let written = write_tree(dir.path(), &files, RunMode::default()).expect("write");
        assert_eq!(written, files.len());
        let again = write_tree(dir.path(), &files, RunMode::default()).expect("rewrite");
        assert_eq!(again, 0);
        let mode = fs::metadata(dir.path().join("bin/restic-home"))
            .expect("stat")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let files = planned(CONFIG);
        let run_mode = RunMode {
            dry_run: true,
            verbose: false,
        };
        write_tree(dir.path(), &files, run_mode).expect("write");
        assert!(!dir.path().join(UNITS_DIR).exists());
    }

    #[test]
    fn prune_stale_removes_only_generated_files_of_dropped_jobs() {
        let dir = TempDir::new().expect("tempdir");
        let before = planned(CONFIG);
        write_tree(dir.path(), &before, RunMode::default()).expect("write");
        fs::write(dir.path().join("units/handwritten.service"), "[Unit]\n").expect("write");

        let after = planned(
            r#"
jobs:
  prune:
    settings: { RESTIC_REPOSITORY: "/mnt/backup" }
    pruneOpts: ["--keep-daily 7"]
    timerConfig: null
    createWrapper: false
"#,
        );
        let removed = prune_stale(dir.path(), &after, RunMode::default()).expect("prune");
        assert_eq!(removed.len(), 7);
        assert!(dir.path().join("units/handwritten.service").exists());
        assert!(dir.path().join("units/restic-backups-prune.service").exists());
        assert!(!dir.path().join("bin/restic-home").exists());
        assert!(!dir.path().join("data/home").exists());
    }
}
