use crate::compile::command::{Invocation, Restic};
use crate::compile::environment::compose;
use crate::compile::resolve::Job;
use crate::util::paths::wrapper_name;

/// Standalone script that runs restic with the environment of the job's
/// service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub name: String,
    pub environment_file: Option<String>,
    pub exports: Vec<(String, String)>,
    pub search_path: Option<String>,
    pub exec: Invocation,
}

/// The environment is composed again from the job rather than copied from
/// the unit, so both always agree.
pub fn synthesize_wrapper(job: &Job) -> Option<Wrapper> {
    if !job.create_wrapper {
        return None;
    }
    let environment = compose(&job.settings, &job.rclone_settings);
    Some(Wrapper {
        name: wrapper_name(&job.name),
        environment_file: job.environment_file.clone(),
        exports: environment
            .exports()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        search_path: environment.search_path().map(str::to_string),
        exec: Restic(job).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::pipeline::build_pipeline;
    use crate::compile::resolve::tests::job_from_yaml;
    use crate::compile::unit::synthesize_unit;

    #[test]
    fn wrapper_environment_matches_unit_minus_path() {
        let job = job_from_yaml(
            r#"
settings:
  RESTIC_REPOSITORY: "rclone:remote:bucket"
  RESTIC_PASSWORD_FILE: /etc/pw
  PATH: /opt/ssh/bin
  UNSET: null
rcloneSettings:
  RCLONE_CONFIG_REMOTE_TYPE: b2
  RCLONE_FAST_LIST: true
  RCLONE_IGNORED: null
paths: [/home]
"#,
        );
        let unit = synthesize_unit(
            &job,
            compose(&job.settings, &job.rclone_settings),
            &build_pipeline(&job),
        );
        let wrapper = synthesize_wrapper(&job).expect("wrapper");
        let from_unit: Vec<(String, String)> = unit
            .environment
            .iter()
            .filter(|(k, _)| *k != "PATH")
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(wrapper.exports, from_unit);
        assert_eq!(wrapper.search_path.as_deref(), Some("/opt/ssh/bin"));
        assert_eq!(wrapper.name, "restic-test");
        assert!(wrapper.exports.iter().all(|(k, _)| k != "UNSET" && k != "RCLONE_IGNORED"));
    }

    #[test]
    fn wrapper_can_be_disabled() {
        let job = job_from_yaml("settings: { RESTIC_REPOSITORY: /r }\ncreateWrapper: false");
        assert_eq!(synthesize_wrapper(&job), None);
    }

    #[test]
    fn wrapper_passes_extra_options_but_never_inhibits() {
        let job = job_from_yaml(
            "settings: { RESTIC_REPOSITORY: /r }\ninhibitsSleep: true\nextraOptions: [s3.storage-class=STANDARD_IA]",
        );
        let wrapper = synthesize_wrapper(&job).expect("wrapper");
        assert_eq!(wrapper.exec.program, std::path::PathBuf::from("/usr/bin/restic"));
        assert!(wrapper.exec.has_arg("s3.storage-class=STANDARD_IA"));
    }
}
