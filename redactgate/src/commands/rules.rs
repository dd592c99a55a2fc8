// redactgate/src/commands/rules.rs
//! Rules command implementation: listing and editing individual rules.

use anyhow::Result;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};

use redactgate_core::{RedactionService, Rule, RulePatch, RuleSpec};

use crate::cli::{AddRuleCommand, RulesCommand, UpdateRuleCommand};

pub fn run(service: &RedactionService, cmd: RulesCommand) -> Result<()> {
    match cmd {
        RulesCommand::List { json } => list(service, json),
        RulesCommand::Get { id } => get(service, &id),
        RulesCommand::Add(add) => add_rule(service, add),
        RulesCommand::Update(update) => update_rule(service, update),
        RulesCommand::Rm { id } => remove(service, &id),
        RulesCommand::Enable { id } => toggle(service, &id, true),
        RulesCommand::Disable { id } => toggle(service, &id, false),
    }
}

fn list(service: &RedactionService, json: bool) -> Result<()> {
    let rules = service.list_rules();
    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "NAME", "ACTION", "PRIORITY", "ENABLED", "CONDITION"]);
    for rule in &rules {
        table.add_row(vec![
            rule.id.clone(),
            rule.name.clone(),
            rule.action.to_string(),
            rule.priority.to_string(),
            rule.enabled.to_string(),
            rule.condition.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn get(service: &RedactionService, id: &str) -> Result<()> {
    let rule = service.get_rule(id)?;
    print_rule(&rule)
}

fn add_rule(service: &RedactionService, cmd: AddRuleCommand) -> Result<()> {
    let spec = RuleSpec {
        id: cmd.id,
        name: cmd.name,
        description: cmd.description,
        condition: cmd.condition,
        action: cmd.action.into(),
        replacement: cmd.replacement,
        enabled: !cmd.disabled,
        priority: cmd.priority,
        ..Default::default()
    };
    let rule = service.add_rule(spec)?;
    print_rule(&rule)
}

fn update_rule(service: &RedactionService, cmd: UpdateRuleCommand) -> Result<()> {
    let patch = RulePatch {
        name: cmd.name,
        description: cmd.description,
        condition: cmd.condition,
        action: cmd.action.map(Into::into),
        replacement: cmd.replacement,
        priority: cmd.priority,
        ..Default::default()
    };
    let rule = service.update_rule(&cmd.id, patch)?;
    print_rule(&rule)
}

fn remove(service: &RedactionService, id: &str) -> Result<()> {
    service.delete_rule(id)?;
    println!("Removed rule '{id}'.");
    Ok(())
}

fn toggle(service: &RedactionService, id: &str, enabled: bool) -> Result<()> {
    let rule = service.toggle_rule(id, enabled)?;
    println!(
        "Rule '{}' is now {}.",
        rule.id,
        if rule.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn print_rule(rule: &Rule) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(rule)?);
    Ok(())
}
