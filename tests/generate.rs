use std::fs;
use std::io::Write;
use std::path::Path;

use resticgen::cli::args::GenerateArgs;
use resticgen::cli::commands::generate::run_generate;
use resticgen::error::{ConfigError, ResticgenError};
use resticgen::types::RunMode;
use tempfile::{NamedTempFile, TempDir};

const CONFIG: &str = r#"
options:
  dataDir: /etc/resticgen
  searchPath: [/usr/bin, /opt/openssh/bin]
jobs:
  home:
    paths: ["/home"]
    exclude: ["/home/*/.cache"]
    initialize: true
    inhibitsSleep: true
    environmentFile: /etc/restic/home.env
    settings:
      RESTIC_REPOSITORY: "sftp:backup@nas:/srv/restic"
      RESTIC_PASSWORD_FILE: /etc/restic/password
    pruneOpts: ["--keep-daily 7", "--keep-weekly 5"]
    checkOpts: ["--with-cache"]
  offsite:
    dynamicFilesFrom: "find /srv -maxdepth 1 -mindepth 1"
    settings:
      RESTIC_REPOSITORY_FILE: /etc/restic/offsite-repo
    rcloneSettings:
      RCLONE_CONFIG: /etc/rclone.conf
      RCLONE_BWLIMIT: 10M
    timerConfig:
      OnCalendar: "Sun 04:00"
"#;

fn config_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(yaml.as_bytes()).expect("write");
    file
}

fn generate(config: &Path, out: &Path) -> resticgen::error::Result<()> {
    let args = GenerateArgs {
        out: out.to_path_buf(),
        job: Vec::new(),
        prune_stale: true,
        dry_run: false,
    };
    run_generate(config, &args, RunMode::default())
}

fn read(out: &Path, rel: &str) -> String {
    fs::read_to_string(out.join(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
}

#[test]
fn generates_units_timers_wrappers_and_data() {
    let config = config_file(CONFIG);
    let out = TempDir::new().expect("tempdir");
    generate(config.path(), out.path()).expect("generate");

    let service = read(out.path(), "units/restic-backups-home.service");
    assert!(service.contains("EnvironmentFile=/etc/restic/home.env\n"));
    assert!(service.contains("Environment=\"PATH=/usr/bin:/opt/openssh/bin\"\n"));
    assert!(service.contains(
        "ExecStart=/usr/bin/restic forget --prune --keep-daily 7 --keep-weekly 5\n"
    ));
    assert!(service.contains("ExecStart=/usr/bin/restic check --with-cache\n"));
    let backup_line = service
        .lines()
        .find(|l| l.starts_with("ExecStart=/usr/bin/systemd-inhibit"))
        .expect("inhibited backup");
    assert!(backup_line.contains("--files-from=/run/restic-backups-home/includes"));

    let timer = read(out.path(), "units/restic-backups-offsite.timer");
    assert!(timer.contains("OnCalendar=Sun 04:00\n"));
    assert!(timer.contains("Unit=restic-backups-offsite.service\n"));

    let pre_start = read(out.path(), "data/offsite/pre-start");
    assert!(pre_start.contains(
        "/etc/resticgen/offsite/dynamic-files-from >> /run/restic-backups-offsite/includes\n"
    ));
    let post_stop = read(out.path(), "data/offsite/post-stop");
    assert!(post_stop.ends_with("/bin/rm /run/restic-backups-offsite/includes\n"));

    let wrapper = read(out.path(), "bin/restic-offsite");
    assert!(wrapper.contains("RCLONE_BWLIMIT=10M\n"));
    assert!(wrapper.contains("RESTIC_REPOSITORY_FILE=/etc/restic/offsite-repo\n"));
    assert!(wrapper.contains("PATH=/usr/bin:/opt/openssh/bin:$PATH\n"));
}

#[test]
fn wrapper_exports_match_unit_environment() {
    let config = config_file(CONFIG);
    let out = TempDir::new().expect("tempdir");
    generate(config.path(), out.path()).expect("generate");

    for job in ["home", "offsite"] {
        let service = read(out.path(), &format!("units/restic-backups-{job}.service"));
        let wrapper = read(out.path(), &format!("bin/restic-{job}"));
        let unit_keys: Vec<&str> = service
            .lines()
            .filter_map(|l| l.strip_prefix("Environment=\""))
            .filter_map(|l| l.split('=').next())
            .filter(|k| *k != "PATH")
            .collect();
        let wrapper_keys: Vec<&str> = wrapper
            .lines()
            .filter(|l| !l.starts_with('#') && !l.starts_with("PATH="))
            .filter_map(|l| l.split_once('=').map(|(k, _)| k))
            .filter(|k| k.chars().all(|c| c.is_ascii_uppercase() || c == '_'))
            .collect();
        assert_eq!(unit_keys, wrapper_keys, "job {job}");
    }
}

#[test]
fn configuration_errors_write_nothing() {
    let config = config_file(
        r#"
jobs:
  good:
    paths: [/home]
    settings: { RESTIC_REPOSITORY: /mnt/backup }
  legacy:
    repository: /mnt/backup
    passwordFile: /etc/pw
    paths: [/srv]
"#,
    );
    let out = TempDir::new().expect("tempdir");
    let err = generate(config.path(), out.path()).unwrap_err();
    match err {
        ResticgenError::Config(ConfigError::Jobs(errs)) => {
            assert_eq!(errs.len(), 3);
            assert!(errs.iter().all(|e| e.job() == "legacy"));
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(fs::read_dir(out.path()).expect("read_dir").count(), 0);
}

#[test]
fn shipped_example_config_compiles() {
    let cfg = resticgen::config::parse_config(include_str!("../resticgen.example.yaml"))
        .expect("parse example");
    let artifacts = resticgen::compile::compile_config(&cfg, &[]).expect("compile example");
    assert_eq!(artifacts.len(), 3);
    let verify = artifacts
        .iter()
        .find(|a| a.job.name == "verify")
        .expect("verify job");
    assert!(verify.timer.is_none());
    assert!(verify.wrapper.is_none());
    assert_eq!(verify.unit.exec_start.len(), 1);
    let text = resticgen::render::systemd::service_unit(&verify.unit);
    assert!(
        text.contains("ExecStart=/usr/bin/restic check --read-data-subset=5%%\n"),
        "{text}"
    );
}
