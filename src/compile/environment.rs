use std::collections::BTreeMap;

use crate::config::{EnvMap, Settings};
use crate::types::EnvValue;

pub const SEARCH_PATH_KEY: &str = "PATH";

/// The merged runtime environment of a job, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment(BTreeMap<String, String>);

impl Environment {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn search_path(&self) -> Option<&str> {
        self.get(SEARCH_PATH_KEY)
    }

    /// Entries a shell should export; the search path is handled apart.
    pub fn exports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| *k != SEARCH_PATH_KEY)
    }
}

/// Merge restic settings with the rclone transport settings. Unset values
/// are dropped first; rclone entries are layered last.
pub fn compose(settings: &Settings, rclone_settings: &EnvMap) -> Environment {
    let mut merged: BTreeMap<String, String> = settings
        .entries()
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect();
    for (key, value) in rclone_settings {
        if let Some(value) = value {
            merged.insert(key.clone(), EnvValue::to_env_string(value));
        }
    }
    Environment(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(yaml: &str) -> Settings {
        serde_yaml::from_str(yaml).expect("settings")
    }

    fn rclone(yaml: &str) -> EnvMap {
        serde_yaml::from_str(yaml).expect("rclone settings")
    }

    #[test]
    fn null_entries_are_dropped() {
        let env = compose(
            &settings("{RESTIC_REPOSITORY: /r, AWS_PROFILE: null, EMPTY: ''}"),
            &rclone("{RCLONE_VERBOSE: null}"),
        );
        assert_eq!(env.get("RESTIC_REPOSITORY"), Some("/r"));
        assert_eq!(env.get("AWS_PROFILE"), None);
        assert_eq!(env.get("RCLONE_VERBOSE"), None);
        assert_eq!(env.get("EMPTY"), Some(""));
        assert_eq!(env.get("RESTIC_REPOSITORY_FILE"), None);
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn rclone_settings_win_on_collision() {
        let env = compose(
            &settings("{RESTIC_REPOSITORY: 'rclone:b2:bucket', RCLONE_CONFIG: /a}"),
            &rclone("{RCLONE_CONFIG: /b, RCLONE_FAST_LIST: true}"),
        );
        assert_eq!(env.get("RCLONE_CONFIG"), Some("/b"));
        assert_eq!(env.get("RCLONE_FAST_LIST"), Some("true"));
    }

    #[test]
    fn exports_skip_search_path() {
        let env = compose(&settings("{RESTIC_REPOSITORY: /r, PATH: /usr/bin}"), &EnvMap::new());
        assert_eq!(env.search_path(), Some("/usr/bin"));
        let keys: Vec<&str> = env.exports().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["RESTIC_REPOSITORY"]);
    }
}
