//! The one-shot service descriptor of a job.

use std::path::PathBuf;

use crate::compile::command::{Invocation, Step};
use crate::compile::environment::Environment;
use crate::compile::pipeline::Pipeline;
use crate::compile::resolve::Job;
use crate::util::paths::unit_name;

pub const PRE_START: &str = "pre-start";
pub const POST_STOP: &str = "post-stop";
const NETWORK_TARGET: &str = "network-online.target";
const CACHE_DIRECTORY_MODE: &str = "0700";

/// A phase rendered into its own script, referenced from the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseScript {
    pub path: PathBuf,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub name: String,
    pub description: String,
    pub environment: Environment,
    pub environment_file: Option<String>,
    pub user: Option<String>,
    pub private_tmp: bool,
    pub runtime_directory: Option<String>,
    pub cache_directory: Option<String>,
    pub cache_directory_mode: Option<&'static str>,
    pub restart_if_changed: bool,
    pub wants: Vec<String>,
    pub after: Vec<String>,
    pub pre_start: Option<PhaseScript>,
    pub exec_start: Vec<Invocation>,
    pub post_stop: Option<PhaseScript>,
}

impl ServiceUnit {
    pub fn file_name(&self) -> String {
        format!("{}.service", self.name)
    }
}

/// Builds a [`ServiceUnit`] from a minimal one-shot descriptor. Each
/// method adds one independent aspect.
pub struct UnitBuilder<'a> {
    job: &'a Job,
    unit: ServiceUnit,
}

impl<'a> UnitBuilder<'a> {
    pub fn new(job: &'a Job) -> Self {
        let name = unit_name(&job.name);
        Self {
            job,
            unit: ServiceUnit {
                description: format!("restic backup {}", job.name),
                name,
                environment: Environment::default(),
                environment_file: None,
                user: None,
                private_tmp: false,
                runtime_directory: None,
                cache_directory: None,
                cache_directory_mode: None,
                restart_if_changed: false,
                wants: Vec::new(),
                after: Vec::new(),
                pre_start: None,
                exec_start: Vec::new(),
                post_stop: None,
            },
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.unit.environment = environment;
        self
    }

    pub fn user(mut self) -> Self {
        self.unit.user = Some(self.job.user.clone());
        self
    }

    pub fn isolation(mut self) -> Self {
        self.unit.private_tmp = true;
        self.unit.runtime_directory = Some(self.unit.name.clone());
        self.unit.cache_directory = Some(self.unit.name.clone());
        self.unit.cache_directory_mode = Some(CACHE_DIRECTORY_MODE);
        self
    }

    /// Values from the file override inline settings at execution time.
    pub fn environment_file(mut self) -> Self {
        self.unit.environment_file = self.job.environment_file.clone();
        self
    }

    pub fn network(mut self) -> Self {
        self.unit.wants.push(NETWORK_TARGET.to_string());
        self.unit.after.push(NETWORK_TARGET.to_string());
        self
    }

    pub fn pre_start(mut self, steps: Option<&[Step]>) -> Self {
        self.unit.pre_start = steps.map(|steps| PhaseScript {
            path: self.job.data_dir.join(PRE_START),
            steps: steps.to_vec(),
        });
        self
    }

    pub fn main(mut self, invocations: &[Invocation]) -> Self {
        self.unit.exec_start = invocations.to_vec();
        self
    }

    pub fn post_stop(mut self, steps: Option<&[Step]>) -> Self {
        self.unit.post_stop = steps.map(|steps| PhaseScript {
            path: self.job.data_dir.join(POST_STOP),
            steps: steps.to_vec(),
        });
        self
    }

    pub fn build(self) -> ServiceUnit {
        self.unit
    }
}

pub fn synthesize_unit(job: &Job, environment: Environment, pipeline: &Pipeline) -> ServiceUnit {
    UnitBuilder::new(job)
        .environment(environment)
        .user()
        .isolation()
        .environment_file()
        .network()
        .pre_start(pipeline.prepare.as_deref())
        .main(&pipeline.main)
        .post_stop(pipeline.cleanup.as_deref())
        .build()
}
