use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResticgenError};

pub const UNIT_PREFIX: &str = "restic-backups-";
pub const WRAPPER_PREFIX: &str = "restic-";
const RUNTIME_BASE: &str = "/run";
const CACHE_BASE: &str = "/var/cache";

pub fn is_safe_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Unit name without suffix; also the runtime and cache directory name.
pub fn unit_name(job: &str) -> String {
    format!("{}{}", UNIT_PREFIX, job)
}

pub fn runtime_dir(job: &str) -> PathBuf {
    Path::new(RUNTIME_BASE).join(unit_name(job))
}

pub fn files_from_path(job: &str) -> PathBuf {
    runtime_dir(job).join("includes")
}

pub fn cache_dir(job: &str) -> PathBuf {
    Path::new(CACHE_BASE).join(unit_name(job))
}

pub fn wrapper_name(job: &str) -> String {
    format!("{}{}", WRAPPER_PREFIX, job)
}

pub fn side_file_dir(data_dir: &Path, job: &str) -> PathBuf {
    data_dir.join(job)
}

pub fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    if path.exists() {
        let meta = fs::metadata(path)
            .map_err(|e| ResticgenError::message(format!("stat {}: {}", path.display(), e)))?;
        if !meta.is_dir() {
            return Err(ResticgenError::message(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        return Ok(());
    }
    fs::create_dir_all(path)
        .map_err(|e| ResticgenError::message(format!("create {}: {}", path.display(), e)))?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ResticgenError::message(format!("chmod {}: {}", path.display(), e)))?;
    Ok(())
}
