use std::path::{Path, PathBuf};

use crate::compile::resolve::Job;

/// One argument of an invocation. `Verbatim` arguments are user supplied
/// option strings that reach the command line unquoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Quoted(String),
    Verbatim(String),
}

impl Arg {
    pub fn as_str(&self) -> &str {
        match self {
            Arg::Quoted(s) | Arg::Verbatim(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<Arg>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Quoted(arg.into()));
        self
    }

    pub fn verbatim(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Verbatim(arg.into()));
        self
    }

    pub fn verbatim_all<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|a| Arg::Verbatim(a.into())));
        self
    }

    /// Run `self` under `prefix`, e.g. an inhibitor.
    pub fn wrapped_by(self, prefix: Invocation) -> Self {
        let mut args = prefix.args;
        args.push(Arg::Quoted(self.program.to_string_lossy().to_string()));
        args.extend(self.args);
        Self {
            program: prefix.program,
            args,
        }
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a.as_str() == arg)
    }

    pub fn arg_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.args
            .iter()
            .map(Arg::as_str)
            .find(|a| a.starts_with(prefix))
    }
}

/// One line of a phase script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run(Invocation),
    /// `probe > /dev/null || fallback`
    Probe {
        probe: Invocation,
        fallback: Invocation,
    },
    /// `source >> target`
    Append { source: Invocation, target: PathBuf },
    Remove(PathBuf),
}

pub struct Restic<'a>(pub &'a Job);
pub struct Inhibit<'a>(pub &'a Job);
pub struct Backup<'a> {
    pub job: &'a Job,
    pub exclude_file: Option<&'a Path>,
}
pub struct Forget<'a>(pub &'a Job);
pub struct CheckRepo<'a>(pub &'a Job);
pub struct CatConfig<'a>(pub &'a Job);
pub struct Init<'a>(pub &'a Job);

impl<'a> From<Restic<'a>> for Invocation {
    fn from(restic: Restic<'a>) -> Self {
        let mut cmd = Invocation::new(&restic.0.package);
        for opt in &restic.0.extra_options {
            cmd = cmd.arg("-o").verbatim(opt.clone());
        }
        cmd
    }
}

impl<'a> From<Inhibit<'a>> for Invocation {
    fn from(inhibit: Inhibit<'a>) -> Self {
        Invocation::new(&inhibit.0.inhibit_package)
            .arg("--mode=block")
            .arg("--who=restic")
            .arg("--what=sleep")
            .arg(format!("--why=Scheduled backup {}", inhibit.0.name))
    }
}

impl<'a> From<Backup<'a>> for Invocation {
    fn from(backup: Backup<'a>) -> Self {
        let job = backup.job;
        let mut cmd = Invocation::from(Restic(job))
            .arg("backup")
            .verbatim_all(job.extra_backup_args.iter().cloned());
        if let Some(exclude_file) = backup.exclude_file {
            cmd = cmd.arg(format!("--exclude-file={}", exclude_file.display()));
        }
        cmd = cmd.arg(format!("--files-from={}", job.files_from.display()));
        if job.inhibits_sleep {
            cmd = cmd.wrapped_by(Inhibit(job).into());
        }
        cmd
    }
}

impl<'a> From<Forget<'a>> for Invocation {
    fn from(forget: Forget<'a>) -> Self {
        Invocation::from(Restic(forget.0))
            .arg("forget")
            .arg("--prune")
            .verbatim_all(forget.0.prune_opts.iter().cloned())
    }
}

impl<'a> From<CheckRepo<'a>> for Invocation {
    fn from(check: CheckRepo<'a>) -> Self {
        Invocation::from(Restic(check.0))
            .arg("check")
            .verbatim_all(check.0.check_opts.iter().cloned())
    }
}

impl<'a> From<CatConfig<'a>> for Invocation {
    fn from(cat: CatConfig<'a>) -> Self {
        Invocation::from(Restic(cat.0)).arg("cat").arg("config")
    }
}

impl<'a> From<Init<'a>> for Invocation {
    fn from(init: Init<'a>) -> Self {
        Invocation::from(Restic(init.0)).arg("init")
    }
}
