//! Text serialization of compiled descriptors. Structured commands become
//! strings only here.

pub mod shell;
pub mod systemd;

pub const GENERATED_MARKER: &str = "# Generated by resticgen; edits are overwritten.";
