use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::EnvValue;

/// Freeform environment map; `null` values mean "unset".
pub type EnvMap = BTreeMap<String, Option<EnvValue>>;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub options: ConfigOptions,
    #[serde(default)]
    pub jobs: BTreeMap<String, JobConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restic_package: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inhibit_package: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_path: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub dynamic_files_from: Option<String>,
    #[serde(default)]
    pub backup_prepare_command: Option<String>,
    #[serde(default)]
    pub backup_cleanup_command: Option<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub rclone_settings: EnvMap,
    #[serde(default)]
    pub environment_file: Option<String>,
    #[serde(default)]
    pub extra_options: Vec<String>,
    #[serde(default)]
    pub extra_backup_args: Vec<String>,
    #[serde(default)]
    pub prune_opts: Vec<String>,
    #[serde(default)]
    pub check_opts: Vec<String>,
    #[serde(default)]
    pub initialize: bool,
    #[serde(default)]
    pub run_check: Option<bool>,
    #[serde(default)]
    pub inhibits_sleep: bool,
    #[serde(default)]
    pub user: Option<String>,
    /// Absent means the default schedule, explicit `null` means no timer.
    #[serde(default, deserialize_with = "explicit_null")]
    pub timer_config: Option<Option<BTreeMap<String, EnvValue>>>,
    #[serde(default = "default_true")]
    pub create_wrapper: bool,
    #[serde(default)]
    pub package: Option<PathBuf>,
    #[serde(default)]
    pub search_path: Option<Vec<String>>,

    // Removed options, kept only so their use can be reported.
    #[serde(default, skip_serializing)]
    pub password_file: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing)]
    pub repository: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing)]
    pub repository_file: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing)]
    pub rclone_options: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing)]
    pub rclone_config: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing)]
    pub rclone_config_file: Option<serde_yaml::Value>,
}

impl JobConfig {
    /// Removed options paired with the name they had in the config file.
    pub fn legacy_options(&self) -> [(&'static str, &Option<serde_yaml::Value>); 6] {
        [
            ("passwordFile", &self.password_file),
            ("repository", &self.repository),
            ("repositoryFile", &self.repository_file),
            ("rcloneOptions", &self.rclone_options),
            ("rcloneConfig", &self.rclone_config),
            ("rcloneConfigFile", &self.rclone_config_file),
        ]
    }
}

/// Environment settings for restic. Well-known variables are typed, every
/// other key passes through untouched.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(rename = "RESTIC_REPOSITORY", default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "RESTIC_REPOSITORY_FILE", default, skip_serializing_if = "Option::is_none")]
    pub repository_file: Option<String>,
    #[serde(rename = "RESTIC_PASSWORD_FILE", default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,
    /// Defaulted when absent; explicit `null` leaves it unset.
    #[serde(
        rename = "RESTIC_CACHE_DIR",
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_dir: Option<Option<String>>,
    /// Defaulted from the search path when absent; explicit `null` leaves it unset.
    #[serde(
        rename = "PATH",
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: EnvMap,
}

impl Settings {
    /// All entries as environment strings, `None` for unset values.
    pub fn entries(&self) -> BTreeMap<String, Option<String>> {
        let mut out: BTreeMap<String, Option<String>> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.as_ref().map(EnvValue::to_env_string)))
            .collect();
        let typed = [
            ("RESTIC_REPOSITORY", self.repository.clone()),
            ("RESTIC_REPOSITORY_FILE", self.repository_file.clone()),
            ("RESTIC_PASSWORD_FILE", self.password_file.clone()),
            ("RESTIC_CACHE_DIR", self.cache_dir.clone().flatten()),
            ("PATH", self.path.clone().flatten()),
        ];
        for (key, value) in typed {
            out.insert(key.to_string(), value);
        }
        out
    }
}

fn default_true() -> bool {
    true
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
