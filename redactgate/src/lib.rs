// redactgate/src/lib.rs
//! # RedactGate CLI Application
//!
//! This crate provides the command-line interface over `redactgate-core`:
//! argument parsing in `cli`, subcommand implementations in `commands`, and
//! logging setup in `logger`. The binary entry point lives in `main.rs`.

pub mod cli;
pub mod commands;
pub mod logger;
