use std::fmt;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResticgenError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Jobs(JobErrors),
}

/// A single problem with one job's configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("job {job}: `{field}` is no longer supported; {replacement}")]
    LegacyOption {
        job: String,
        field: &'static str,
        replacement: &'static str,
    },
    #[error(
        "job {job}: settings must set exactly one of RESTIC_REPOSITORY or RESTIC_REPOSITORY_FILE ({found})"
    )]
    Repository { job: String, found: &'static str },
    #[error("job {job}: name must use only letters, digits, '.', '-', '_'")]
    UnsafeName { job: String },
    #[error("job {job}: not part of the configured job set")]
    UnknownJob { job: String },
}

impl JobError {
    pub fn job(&self) -> &str {
        match self {
            JobError::LegacyOption { job, .. }
            | JobError::Repository { job, .. }
            | JobError::UnsafeName { job }
            | JobError::UnknownJob { job } => job,
        }
    }
}

/// Every job error found while resolving a configuration set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobErrors(pub Vec<JobError>);

impl JobErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobError> {
        self.0.iter()
    }
}

impl fmt::Display for JobErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, ResticgenError>;

impl ResticgenError {
    pub fn message(msg: impl Into<String>) -> Self {
        ResticgenError::Message(msg.into())
    }
}

impl From<ConfigError> for ResticgenError {
    fn from(err: ConfigError) -> Self {
        ResticgenError::Config(err)
    }
}

impl From<JobErrors> for ResticgenError {
    fn from(errs: JobErrors) -> Self {
        ResticgenError::Config(ConfigError::Jobs(errs))
    }
}
