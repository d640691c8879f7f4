//! Compile declarative restic backup jobs into systemd service units,
//! timers and standalone wrapper scripts.

pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod output;
pub mod render;
pub mod types;
pub mod util;
