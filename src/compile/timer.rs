use std::collections::BTreeMap;

use crate::compile::resolve::Job;
use crate::util::paths::unit_name;

const WANTED_BY: &str = "timers.target";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerUnit {
    pub name: String,
    /// The service this timer starts.
    pub unit: String,
    pub fields: BTreeMap<String, String>,
    pub wanted_by: String,
}

impl TimerUnit {
    pub fn file_name(&self) -> String {
        format!("{}.timer", self.name)
    }
}

/// Schedule fields are passed through unvalidated; systemd owns the syntax.
pub fn synthesize_timer(job: &Job) -> Option<TimerUnit> {
    let fields = job.timer.as_ref()?;
    let name = unit_name(&job.name);
    Some(TimerUnit {
        unit: format!("{}.service", name),
        name,
        fields: fields.clone(),
        wanted_by: WANTED_BY.to_string(),
    })
}
