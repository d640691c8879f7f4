use std::fmt::Write;

use crate::compile::command::{Arg, Invocation};
use crate::compile::timer::TimerUnit;
use crate::compile::unit::ServiceUnit;
use crate::render::GENERATED_MARKER;
use crate::util::quote;

pub fn exec_line(cmd: &Invocation) -> String {
    let mut line = quote::systemd_arg(&cmd.program.to_string_lossy());
    for arg in &cmd.args {
        line.push(' ');
        match arg {
            Arg::Quoted(s) => line.push_str(&quote::systemd_arg(s)),
            Arg::Verbatim(s) => line.push_str(&quote::systemd_verbatim(s)),
        }
    }
    line
}

// Writing into a String cannot fail, so the fmt::Results are dropped.
pub fn service_unit(unit: &ServiceUnit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", GENERATED_MARKER);
    let _ = writeln!(out, "[Unit]");
    let _ = writeln!(out, "Description={}", unit.description);
    for target in &unit.wants {
        let _ = writeln!(out, "Wants={}", target);
    }
    for target in &unit.after {
        let _ = writeln!(out, "After={}", target);
    }
    let _ = writeln!(out, "X-RestartIfChanged={}", unit.restart_if_changed);
    let _ = writeln!(out);
    let _ = writeln!(out, "[Service]");
    let _ = writeln!(out, "Type=oneshot");
    if let Some(user) = &unit.user {
        let _ = writeln!(out, "User={}", user);
    }
    for (key, value) in unit.environment.iter() {
        let _ = writeln!(out, "Environment={}", quote::systemd_env(key, value));
    }
    if let Some(file) = &unit.environment_file {
        let _ = writeln!(out, "EnvironmentFile={}", file);
    }
    if unit.private_tmp {
        let _ = writeln!(out, "PrivateTmp=true");
    }
    if let Some(dir) = &unit.runtime_directory {
        let _ = writeln!(out, "RuntimeDirectory={}", dir);
    }
    if let Some(dir) = &unit.cache_directory {
        let _ = writeln!(out, "CacheDirectory={}", dir);
    }
    if let Some(mode) = unit.cache_directory_mode {
        let _ = writeln!(out, "CacheDirectoryMode={}", mode);
    }
    if let Some(script) = &unit.pre_start {
        let _ = writeln!(
            out,
            "ExecStartPre={}",
            quote::systemd_arg(&script.path.to_string_lossy())
        );
    }
    for cmd in &unit.exec_start {
        let _ = writeln!(out, "ExecStart={}", exec_line(cmd));
    }
    if let Some(script) = &unit.post_stop {
        let _ = writeln!(
            out,
            "ExecStopPost={}",
            quote::systemd_arg(&script.path.to_string_lossy())
        );
    }
    out
}

pub fn timer_unit(timer: &TimerUnit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", GENERATED_MARKER);
    let _ = writeln!(out, "[Unit]");
    let _ = writeln!(out, "Description=Schedule for {}", timer.unit);
    let _ = writeln!(out);
    let _ = writeln!(out, "[Timer]");
    for (key, value) in &timer.fields {
        let _ = writeln!(out, "{}={}", key, value);
    }
    let _ = writeln!(out, "Unit={}", timer.unit);
    let _ = writeln!(out);
    let _ = writeln!(out, "[Install]");
    let _ = writeln!(out, "WantedBy={}", timer.wanted_by);
    out
}
