// redactgate/src/commands/sets.rs
//! Sets command implementation: managing rule sets and the default selection.

use anyhow::Result;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};

use redactgate_core::{RedactionService, RuleSet, RuleSetSpec};

use crate::cli::{AddSetCommand, SetsCommand};

pub fn run(service: &RedactionService, cmd: SetsCommand) -> Result<()> {
    match cmd {
        SetsCommand::List { json } => list(service, json),
        SetsCommand::Get { id } => get(service, &id),
        SetsCommand::Add(add) => add_set(service, add),
        SetsCommand::Rm { id } => remove(service, &id),
        SetsCommand::SetDefault { id } => set_default(service, &id),
    }
}

fn list(service: &RedactionService, json: bool) -> Result<()> {
    let sets = service.list_rule_sets();
    if json {
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    let default_id = service.default_rule_set_id();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "NAME", "ENABLED", "RULES", "DEFAULT"]);
    for set in &sets {
        table.add_row(vec![
            set.id.clone(),
            set.name.clone(),
            set.enabled.to_string(),
            set.rules.len().to_string(),
            if set.id == default_id {
                "*".to_string()
            } else {
                String::new()
            },
        ]);
    }
    println!("{table}");
    Ok(())
}

fn get(service: &RedactionService, id: &str) -> Result<()> {
    let set = service.get_rule_set(id)?;
    print_set(&set)
}

fn add_set(service: &RedactionService, cmd: AddSetCommand) -> Result<()> {
    let spec = RuleSetSpec {
        id: cmd.id,
        name: cmd.name,
        description: cmd.description,
        rules: cmd.rules,
        ..Default::default()
    };
    let set = service.add_rule_set(spec)?;
    print_set(&set)
}

fn remove(service: &RedactionService, id: &str) -> Result<()> {
    service.delete_rule_set(id)?;
    println!("Removed rule set '{id}'.");
    Ok(())
}

fn set_default(service: &RedactionService, id: &str) -> Result<()> {
    service.set_default_rule_set(id)?;
    println!("Default rule set is now '{id}'.");
    Ok(())
}

fn print_set(set: &RuleSet) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(set)?);
    Ok(())
}
