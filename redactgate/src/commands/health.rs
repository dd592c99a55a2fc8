// redactgate/src/commands/health.rs
//! Health command implementation.

use anyhow::Result;

use redactgate_core::RedactionService;

pub fn run(service: &RedactionService) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&service.health())?);
    Ok(())
}
