// redactgate/src/main.rs
//! RedactGate entry point.
//!
//! Opens the rule registry, builds the redaction service, and dispatches to
//! the subcommand implementations.

use anyhow::{Context, Result};
use clap::Parser;

use redactgate::cli::{Cli, Commands};
use redactgate::commands;
use redactgate::logger;
use redactgate_core::{JsonFileBackend, RedactionService, default_registry_path};

fn main() -> Result<()> {
    let args = Cli::parse();
    logger::init(args.quiet, args.debug);

    let registry_path = args.registry.clone().unwrap_or_else(default_registry_path);
    log::debug!("Using rule registry at {}", registry_path.display());

    let service = RedactionService::open(Box::new(JsonFileBackend::new(&registry_path)))
        .with_context(|| {
            format!(
                "Failed to open rule registry at {}",
                registry_path.display()
            )
        })?;

    match args.command {
        Commands::Process(cmd) => commands::process::run(&service, cmd),
        Commands::Rules(cmd) => commands::rules::run(&service, cmd),
        Commands::Sets(cmd) => commands::sets::run(&service, cmd),
        Commands::Health => commands::health::run(&service),
    }
}
