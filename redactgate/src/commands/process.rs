// redactgate/src/commands/process.rs
//! Process command implementation: applies a rule set to stdin or a file.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read, Write};

use redactgate_core::RedactionService;

use crate::cli::ProcessCommand;

pub fn run(service: &RedactionService, cmd: ProcessCommand) -> Result<()> {
    let input = read_input(&cmd)?;
    debug!("Read {} byte(s) of input.", input.len());

    let result = service
        .process_text(&input, cmd.rule_set.as_deref())
        .context("Processing failed")?;
    info!("Processing produced {} report entries.", result.matches.len());

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    if cmd.json {
        serde_json::to_writer_pretty(&mut writer, &result)?;
        writeln!(writer)?;
    } else {
        // Exact passthrough: the redacted text and nothing else.
        writer.write_all(result.redacted_text.as_bytes())?;
    }
    writer.flush()?;

    if cmd.report {
        eprintln!("{}", serde_json::to_string_pretty(&result.matches)?);
    }

    if result.blocked {
        let reason = result.block_reason.as_deref().unwrap_or("Blocked");
        if cmd.fail_on_block {
            anyhow::bail!("{reason}");
        }
        warn!("{reason}");
    }
    Ok(())
}

fn read_input(cmd: &ProcessCommand) -> Result<String> {
    match &cmd.input_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
