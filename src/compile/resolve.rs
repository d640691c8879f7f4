use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::compile::CompileContext;
use crate::config::{EnvMap, JobConfig, Settings};
use crate::error::JobError;
use crate::types::EnvValue;
use crate::util::paths::{cache_dir, files_from_path, is_safe_name, side_file_dir};

const DEFAULT_USER: &str = "root";

const LEGACY_REPLACEMENTS: [(&str, &str); 6] = [
    ("passwordFile", "use settings.RESTIC_PASSWORD_FILE instead"),
    ("repository", "use settings.RESTIC_REPOSITORY instead"),
    ("repositoryFile", "use settings.RESTIC_REPOSITORY_FILE instead"),
    (
        "rcloneOptions",
        "use RCLONE_<OPTION> entries in rcloneSettings instead",
    ),
    (
        "rcloneConfig",
        "use RCLONE_CONFIG_<REMOTE>_<KEY> entries in rcloneSettings instead",
    ),
    ("rcloneConfigFile", "use rcloneSettings.RCLONE_CONFIG instead"),
];

/// A fully defaulted, validated job.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub paths: Option<Vec<String>>,
    pub exclude: Vec<String>,
    pub dynamic_files_from: Option<String>,
    pub backup_prepare_command: Option<String>,
    pub backup_cleanup_command: Option<String>,
    pub settings: Settings,
    pub rclone_settings: EnvMap,
    pub environment_file: Option<String>,
    pub extra_options: Vec<String>,
    pub extra_backup_args: Vec<String>,
    pub prune_opts: Vec<String>,
    pub check_opts: Vec<String>,
    pub initialize: bool,
    pub run_check: bool,
    pub inhibits_sleep: bool,
    pub user: String,
    pub timer: Option<BTreeMap<String, String>>,
    pub create_wrapper: bool,
    pub package: PathBuf,
    pub inhibit_package: PathBuf,
    /// Directory the job's side files are installed to.
    pub data_dir: PathBuf,
    /// Transient list of paths handed to `--files-from`.
    pub files_from: PathBuf,
    pub do_backup: bool,
}

fn is_set(value: &Option<serde_yaml::Value>) -> bool {
    match value {
        None | Some(serde_yaml::Value::Null) => false,
        Some(serde_yaml::Value::String(s)) => !s.is_empty(),
        Some(serde_yaml::Value::Mapping(m)) => !m.is_empty(),
        Some(serde_yaml::Value::Sequence(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn default_timer() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("OnCalendar".to_string(), "daily".to_string()),
        ("Persistent".to_string(), "true".to_string()),
    ])
}

pub fn resolve_job(
    ctx: &CompileContext,
    name: &str,
    raw: &JobConfig,
) -> Result<Job, Vec<JobError>> {
    let mut errors = Vec::new();

    if !is_safe_name(name) {
        errors.push(JobError::UnsafeName { job: name.to_string() });
    } else if !ctx.job_names.contains(name) {
        errors.push(JobError::UnknownJob { job: name.to_string() });
    }

    let legacy = raw.legacy_options().into_iter().zip(LEGACY_REPLACEMENTS);
    for ((field, value), (_, replacement)) in legacy {
        if is_set(value) {
            errors.push(JobError::LegacyOption {
                job: name.to_string(),
                field,
                replacement,
            });
        }
    }

    match (&raw.settings.repository, &raw.settings.repository_file) {
        (Some(_), Some(_)) => errors.push(JobError::Repository {
            job: name.to_string(),
            found: "both are set",
        }),
        (None, None) => errors.push(JobError::Repository {
            job: name.to_string(),
            found: "neither is set",
        }),
        _ => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let paths = raw.paths.clone();
    let do_backup =
        raw.dynamic_files_from.is_some() || paths.as_ref().is_some_and(|p| !p.is_empty());
    let run_check = raw.run_check.unwrap_or(!raw.check_opts.is_empty());
    let search_path = raw.search_path.clone().unwrap_or_else(|| ctx.search_path.clone());

    let mut settings = raw.settings.clone();
    if settings.cache_dir.is_none() {
        settings.cache_dir = Some(Some(cache_dir(name).to_string_lossy().to_string()));
    }
    if settings.path.is_none() && !search_path.is_empty() {
        settings.path = Some(Some(search_path.join(":")));
    }

    let timer = match &raw.timer_config {
        None => Some(default_timer()),
        Some(None) => None,
        Some(Some(fields)) => Some(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), EnvValue::to_env_string(v)))
                .collect(),
        ),
    };

    Ok(Job {
        name: name.to_string(),
        paths,
        exclude: raw.exclude.clone(),
        dynamic_files_from: raw.dynamic_files_from.clone(),
        backup_prepare_command: raw.backup_prepare_command.clone(),
        backup_cleanup_command: raw.backup_cleanup_command.clone(),
        settings,
        rclone_settings: raw.rclone_settings.clone(),
        environment_file: raw.environment_file.clone(),
        extra_options: raw.extra_options.clone(),
        extra_backup_args: raw.extra_backup_args.clone(),
        prune_opts: raw.prune_opts.clone(),
        check_opts: raw.check_opts.clone(),
        initialize: raw.initialize,
        run_check,
        inhibits_sleep: raw.inhibits_sleep,
        user: raw.user.clone().unwrap_or_else(|| DEFAULT_USER.to_string()),
        timer,
        create_wrapper: raw.create_wrapper,
        package: raw.package.clone().unwrap_or_else(|| ctx.restic_package.clone()),
        inhibit_package: ctx.inhibit_package.clone(),
        data_dir: side_file_dir(&ctx.data_dir, name),
        files_from: files_from_path(name),
        do_backup,
    })
}
