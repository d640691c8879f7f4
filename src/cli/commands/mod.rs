pub mod check;
pub mod generate;
pub mod show;

use crate::error::{ConfigError, ResticgenError};
use crate::types::JobName;

pub(crate) fn selected(jobs: &[JobName]) -> Vec<String> {
    jobs.iter().map(JobName::to_string).collect()
}

pub fn exit_for_error(err: &ResticgenError) -> ! {
    let code = match err {
        ResticgenError::Config(ConfigError::Jobs(errs)) => {
            for job_err in errs.iter() {
                println!("{}", job_err);
            }
            println!("{} configuration error(s); nothing written", errs.len());
            std::process::exit(2);
        }
        ResticgenError::Config(_) => 2,
        ResticgenError::Message(_) | ResticgenError::Io(_) => 1,
    };
    println!("{}", err);
    std::process::exit(code);
}
