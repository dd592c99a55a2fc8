// redactgate/src/commands/mod.rs
//! Subcommand implementations for the `redactgate` binary.

pub mod health;
pub mod process;
pub mod rules;
pub mod sets;
