//! Ordered command sequences for a job's prepare, main and cleanup phases.

use std::path::PathBuf;

use crate::compile::command::{
    Backup, CatConfig, CheckRepo, Forget, Init, Invocation, Step,
};
use crate::compile::resolve::Job;

pub const EXCLUDE_PATTERNS: &str = "exclude-patterns";
pub const STATIC_PATHS: &str = "static-paths";
pub const PREPARE_COMMAND: &str = "backup-prepare-command";
pub const CLEANUP_COMMAND: &str = "backup-cleanup-command";
pub const DYNAMIC_FILES_FROM: &str = "dynamic-files-from";

pub const SCRIPT_SHEBANG: &str = "#!/bin/bash";
const CAT: &str = "/bin/cat";

/// A generated data file referenced from unit commands by absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideFile {
    pub path: PathBuf,
    pub contents: String,
    pub executable: bool,
}

impl SideFile {
    fn list(path: PathBuf, lines: &[String]) -> Self {
        let mut contents = lines.join("\n");
        contents.push('\n');
        Self {
            path,
            contents,
            executable: false,
        }
    }

    fn script(path: PathBuf, body: &str) -> Self {
        let mut contents = String::new();
        if !body.starts_with("#!") {
            contents.push_str(SCRIPT_SHEBANG);
            contents.push('\n');
        }
        contents.push_str(body);
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        Self {
            path,
            contents,
            executable: true,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    /// `None` when the job needs no prepare phase at all.
    pub prepare: Option<Vec<Step>>,
    pub main: Vec<Invocation>,
    /// `None` when the job needs no cleanup phase at all.
    pub cleanup: Option<Vec<Step>>,
    pub side_files: Vec<SideFile>,
}

pub fn build_pipeline(job: &Job) -> Pipeline {
    let mut side_files = Vec::new();
    let prepare = prepare_phase(job, &mut side_files);
    let main = main_phase(job, &mut side_files);
    let cleanup = cleanup_phase(job, &mut side_files);
    Pipeline {
        prepare,
        main,
        cleanup,
        side_files,
    }
}

fn prepare_phase(job: &Job, side_files: &mut Vec<SideFile>) -> Option<Vec<Step>> {
    if !(job.do_backup || job.initialize || job.backup_prepare_command.is_some()) {
        return None;
    }
    let mut steps = Vec::new();
    if let Some(body) = &job.backup_prepare_command {
        let script = SideFile::script(job.data_dir.join(PREPARE_COMMAND), body);
        steps.push(Step::Run(Invocation::new(&script.path)));
        side_files.push(script);
    }
    if job.initialize {
        steps.push(Step::Probe {
            probe: CatConfig(job).into(),
            fallback: Init(job).into(),
        });
    }
    if let Some(paths) = job.paths.as_ref().filter(|p| !p.is_empty()) {
        let list = SideFile::list(job.data_dir.join(STATIC_PATHS), paths);
        steps.push(Step::Append {
            source: Invocation::new(CAT).arg(list.path.to_string_lossy()),
            target: job.files_from.clone(),
        });
        side_files.push(list);
    }
    if let Some(body) = &job.dynamic_files_from {
        let script = SideFile::script(job.data_dir.join(DYNAMIC_FILES_FROM), body);
        steps.push(Step::Append {
            source: Invocation::new(&script.path),
            target: job.files_from.clone(),
        });
        side_files.push(script);
    }
    Some(steps)
}

fn main_phase(job: &Job, side_files: &mut Vec<SideFile>) -> Vec<Invocation> {
    let mut main = Vec::new();
    if job.do_backup {
        let exclude_file = (!job.exclude.is_empty()).then(|| {
            let list = SideFile::list(job.data_dir.join(EXCLUDE_PATTERNS), &job.exclude);
            let path = list.path.clone();
            side_files.push(list);
            path
        });
        main.push(
            Backup {
                job,
                exclude_file: exclude_file.as_deref(),
            }
            .into(),
        );
    }
    if !job.prune_opts.is_empty() {
        main.push(Forget(job).into());
    }
    if job.run_check {
        main.push(CheckRepo(job).into());
    }
    main
}

fn cleanup_phase(job: &Job, side_files: &mut Vec<SideFile>) -> Option<Vec<Step>> {
    if !(job.do_backup || job.backup_cleanup_command.is_some()) {
        return None;
    }
    let mut steps = Vec::new();
    if let Some(body) = &job.backup_cleanup_command {
        let script = SideFile::script(job.data_dir.join(CLEANUP_COMMAND), body);
        steps.push(Step::Run(Invocation::new(&script.path)));
        side_files.push(script);
    }
    if job.do_backup {
        steps.push(Step::Remove(job.files_from.clone()));
    }
    Some(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::command::Arg;
    use crate::compile::resolve::tests::job_from_yaml;

    const REPO: &str = "settings: { RESTIC_REPOSITORY: /mnt/backup, RESTIC_PASSWORD_FILE: /etc/pw }\n";

    fn pipeline(extra: &str) -> Pipeline {
        build_pipeline(&job_from_yaml(&format!("{REPO}{extra}")))
    }

    fn subcommand(cmd: &Invocation) -> Option<&str> {
        cmd.args
            .iter()
            .map(Arg::as_str)
            .find(|a| ["backup", "forget", "check"].contains(a))
    }

    #[test]
    fn home_backup_with_excludes_and_initialize() {
        let p = pipeline("paths: [/home]\nexclude: ['/home/*/.cache']\ninitialize: true");
        assert_eq!(p.main.len(), 1);
        let backup = &p.main[0];
        assert_eq!(subcommand(backup), Some("backup"));
        assert_eq!(
            backup.arg_with_prefix("--exclude-file="),
            Some("--exclude-file=/etc/resticgen/test/exclude-patterns")
        );
        assert_eq!(
            backup.arg_with_prefix("--files-from="),
            Some("--files-from=/run/restic-backups-test/includes")
        );
        let exclude = p
            .side_files
            .iter()
            .find(|f| f.file_name() == EXCLUDE_PATTERNS)
            .expect("exclude file");
        assert_eq!(exclude.contents, "/home/*/.cache\n");
        assert!(!exclude.executable);
    }

    #[test]
    fn prune_only_job() {
        let p = pipeline("paths: []\npruneOpts: ['--keep-daily 7']\nrunCheck: false");
        assert_eq!(p.prepare, None);
        assert_eq!(p.cleanup, None);
        assert_eq!(p.main.len(), 1);
        let forget = &p.main[0];
        assert_eq!(subcommand(forget), Some("forget"));
        assert!(forget.has_arg("--prune"));
        assert_eq!(
            forget.args.last(),
            Some(&Arg::Verbatim("--keep-daily 7".to_string()))
        );
        assert!(p.side_files.is_empty());
    }

    #[test]
    fn nothing_to_do_emits_no_main_commands() {
        let p = pipeline("paths: null");
        assert!(p.main.is_empty());
        assert_eq!(p.prepare, None);
        assert_eq!(p.cleanup, None);
    }

    #[test]
    fn prepare_order_is_fixed() {
        let p = pipeline(
            "paths: [/srv]\ndynamicFilesFrom: 'find /data -maxdepth 1'\ninitialize: true\nbackupPrepareCommand: 'mount /data'",
        );
        let steps = p.prepare.expect("prepare");
        assert_eq!(steps.len(), 4);
        assert!(matches!(&steps[0], Step::Run(cmd) if cmd.program.ends_with(PREPARE_COMMAND)));
        assert!(matches!(&steps[1], Step::Probe { .. }));
        assert!(matches!(&steps[2], Step::Append { source, .. } if source.program == PathBuf::from(CAT)));
        assert!(
            matches!(&steps[3], Step::Append { source, .. } if source.program.ends_with(DYNAMIC_FILES_FROM))
        );
    }

    #[test]
    fn prepare_order_holds_for_subsets() {
        let p = pipeline("dynamicFilesFrom: 'echo /etc'\nbackupPrepareCommand: 'true'");
        let steps = p.prepare.expect("prepare");
        assert_eq!(steps.len(), 2);
        assert!(matches!(&steps[0], Step::Run(_)));
        assert!(matches!(&steps[1], Step::Append { .. }));

        let p = pipeline("initialize: true");
        let steps = p.prepare.expect("prepare");
        assert_eq!(steps.len(), 1);
        assert!(matches!(&steps[0], Step::Probe { .. }));
        assert_eq!(p.cleanup, None);
    }

    #[test]
    fn forced_check_has_no_trailing_options() {
        let p = pipeline("runCheck: true");
        assert_eq!(p.main.len(), 1);
        let check = &p.main[0];
        assert_eq!(subcommand(check), Some("check"));
        assert_eq!(check.args.last(), Some(&Arg::Quoted("check".to_string())));
    }

    #[test]
    fn backup_prune_check_run_in_order() {
        let p = pipeline(
            "paths: [/home]\npruneOpts: ['--keep-weekly 4']\ncheckOpts: ['--read-data-subset=10%']\nextraBackupArgs: ['--one-file-system']",
        );
        let order: Vec<Option<&str>> = p.main.iter().map(subcommand).collect();
        assert_eq!(order, vec![Some("backup"), Some("forget"), Some("check")]);
        assert!(p.main[0].has_arg("--one-file-system"));
        assert_eq!(p.main[0].arg_with_prefix("--exclude-file="), None);
    }

    #[test]
    fn cleanup_runs_command_then_removes_file_list() {
        let p = pipeline("paths: [/home]\nbackupCleanupCommand: 'umount /data'");
        let steps = p.cleanup.expect("cleanup");
        assert_eq!(steps.len(), 2);
        assert!(matches!(&steps[0], Step::Run(_)));
        assert_eq!(
            steps[1],
            Step::Remove(PathBuf::from("/run/restic-backups-test/includes"))
        );

        let p = pipeline("backupCleanupCommand: 'umount /data'");
        assert_eq!(p.cleanup.expect("cleanup").len(), 1);
    }

    #[test]
    fn scripts_get_a_shebang() {
        let p = pipeline("backupPrepareCommand: 'echo hi'");
        let script = &p.side_files[0];
        assert!(script.executable);
        assert_eq!(script.contents, "#!/bin/bash\necho hi\n");

        let p = pipeline("backupPrepareCommand: \"#!/bin/sh\\necho hi\\n\"");
        assert_eq!(p.side_files[0].contents, "#!/bin/sh\necho hi\n");
    }
}
