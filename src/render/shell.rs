use std::fmt::Write;

use crate::compile::command::{Arg, Invocation, Step};
use crate::compile::pipeline::SCRIPT_SHEBANG;
use crate::compile::unit::PhaseScript;
use crate::compile::wrapper::Wrapper;
use crate::render::GENERATED_MARKER;
use crate::util::quote;

const RM: &str = "/bin/rm";

pub fn invocation(cmd: &Invocation) -> String {
    let mut line = quote::shell(&cmd.program.to_string_lossy());
    for arg in &cmd.args {
        line.push(' ');
        match arg {
            Arg::Quoted(s) => line.push_str(&quote::shell(s)),
            Arg::Verbatim(s) => line.push_str(s),
        }
    }
    line
}

pub fn step(step: &Step) -> String {
    match step {
        Step::Run(cmd) => invocation(cmd),
        Step::Probe { probe, fallback } => {
            format!("{} > /dev/null || {}", invocation(probe), invocation(fallback))
        }
        Step::Append { source, target } => format!(
            "{} >> {}",
            invocation(source),
            quote::shell(&target.to_string_lossy())
        ),
        Step::Remove(path) => format!("{} {}", RM, quote::shell(&path.to_string_lossy())),
    }
}

pub fn phase_script(script: &PhaseScript) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", SCRIPT_SHEBANG);
    let _ = writeln!(out, "{}", GENERATED_MARKER);
    let _ = writeln!(out, "set -e");
    for s in &script.steps {
        let _ = writeln!(out, "{}", step(s));
    }
    out
}

pub fn wrapper_script(wrapper: &Wrapper) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", SCRIPT_SHEBANG);
    let _ = writeln!(out, "{}", GENERATED_MARKER);
    let _ = writeln!(out, "set -a");
    if let Some(file) = &wrapper.environment_file {
        let _ = writeln!(out, "source {}", quote::shell(file));
    }
    for (key, value) in &wrapper.exports {
        let _ = writeln!(out, "{}={}", key, quote::shell(value));
    }
    if let Some(path) = &wrapper.search_path {
        let _ = writeln!(out, "PATH={}:$PATH", quote::shell(path));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "exec {} \"$@\"", invocation(&wrapper.exec));
    out
}
