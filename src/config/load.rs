use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::model::Config;
use crate::error::{ConfigError, Result, ResticgenError};

pub fn load_config(path: &Path) -> Result<Config> {
    let mut contents = String::new();
    File::open(path)
        .map_err(|e| ResticgenError::message(format!("open {}: {}", path.display(), e)))?
        .read_to_string(&mut contents)
        .map_err(|e| ResticgenError::message(format!("read {}: {}", path.display(), e)))?;
    let cfg = parse_config(&contents)?;
    debug!(path = %path.display(), jobs = cfg.jobs.len(), "loaded config");
    Ok(cfg)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let cfg: Config =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    if cfg.jobs.is_empty() {
        return Err(ConfigError::Invalid("no jobs configured".to_string()).into());
    }
    Ok(cfg)
}
