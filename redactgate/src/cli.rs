// redactgate/src/cli.rs
//! This file defines the command-line interface (CLI) for the redactgate
//! application, including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use redactgate_core::RuleAction;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "redactgate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Gate text through a managed set of redaction rules",
    long_about = "Redactgate pipes text through an ordered set of redaction rules before it leaves your machine. Rules live in a local JSON registry and can redact, flag, block, or transform whatever their patterns match; the `rules` and `sets` commands manage the registry, and `process` applies it.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Path to the rule registry file.
    #[arg(
        long = "registry",
        value_name = "FILE",
        env = "REDACTGATE_REGISTRY",
        global = true,
        help = "Path to the rule registry file (defaults to the per-user config directory)."
    )]
    pub registry: Option<PathBuf>,

    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `redactgate` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Processes an input file or stdin through a rule set.
    #[command(about = "Processes an input file or stdin through a rule set.")]
    Process(ProcessCommand),

    /// Manages individual redaction rules.
    #[command(subcommand, about = "Manages individual redaction rules.")]
    Rules(RulesCommand),

    /// Manages named rule sets.
    #[command(subcommand, about = "Manages named rule sets.")]
    Sets(SetsCommand),

    /// Prints service status and version.
    #[command(about = "Prints service status and version as JSON.")]
    Health,
}

/// Arguments for the `process` command.
#[derive(Parser, Debug)]
pub struct ProcessCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Rule set to apply (defaults to the registry's default set).
    #[arg(long = "rule-set", value_name = "ID", help = "Apply a specific rule set instead of the default one.")]
    pub rule_set: Option<String>,

    /// Print the full result as JSON instead of the bare redacted text.
    #[arg(long, help = "Print the full result (text, matches, block verdict) as JSON.")]
    pub json: bool,

    /// Write the match report to stderr as JSON.
    #[arg(long, conflicts_with = "json", help = "Write the match report to stderr as JSON.")]
    pub report: bool,

    /// Exit with a non-zero code when a block rule matched.
    #[arg(long = "fail-on-block", help = "Exit with a non-zero code when a block rule matched.")]
    pub fail_on_block: bool,
}

/// Subcommands for the `rules` command.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    /// Lists every rule in the registry.
    #[command(about = "Lists every rule in the registry.")]
    List {
        /// Print the rules as JSON instead of a table.
        #[arg(long, help = "Print the rules as JSON instead of a table.")]
        json: bool,
    },

    /// Prints one rule as JSON.
    #[command(about = "Prints one rule as JSON.")]
    Get {
        /// Id of the rule to print.
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Adds a rule to the registry and the default rule set.
    #[command(about = "Adds a rule to the registry and the default rule set.")]
    Add(AddRuleCommand),

    /// Updates fields of an existing rule.
    #[command(about = "Updates fields of an existing rule.")]
    Update(UpdateRuleCommand),

    /// Removes a rule from the registry.
    #[command(about = "Removes a rule from the registry.")]
    Rm {
        /// Id of the rule to remove.
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Enables a rule.
    #[command(about = "Enables a rule.")]
    Enable {
        /// Id of the rule to enable.
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Disables a rule without removing it.
    #[command(about = "Disables a rule without removing it.")]
    Disable {
        /// Id of the rule to disable.
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Arguments for `rules add`.
#[derive(Parser, Debug)]
pub struct AddRuleCommand {
    /// Human-readable rule name.
    #[arg(long, value_name = "NAME", help = "Human-readable rule name.")]
    pub name: String,

    /// Regex pattern the rule matches.
    #[arg(long, value_name = "PATTERN", help = "Regex pattern the rule matches.")]
    pub condition: String,

    /// Explicit rule id (derived from the name when omitted).
    #[arg(long, value_name = "ID", help = "Explicit rule id (derived from the name when omitted).")]
    pub id: Option<String>,

    /// What to do with matched text.
    #[arg(long, value_enum, default_value = "redact", help = "What to do with matched text.")]
    pub action: ActionArg,

    /// Replacement text for rewriting actions.
    #[arg(
        long,
        value_name = "TEXT",
        default_value = "",
        help = "Replacement text; when empty, a placeholder is derived from the name."
    )]
    pub replacement: String,

    /// Free-form description.
    #[arg(long, value_name = "TEXT", default_value = "", help = "Free-form description.")]
    pub description: String,

    /// Priority 0-100; higher-priority rules run first.
    #[arg(long, value_name = "N", default_value_t = 0, help = "Priority 0-100; higher-priority rules run first.")]
    pub priority: u8,

    /// Create the rule disabled.
    #[arg(long, help = "Create the rule disabled.")]
    pub disabled: bool,
}

/// Arguments for `rules update`. Only the supplied flags change the rule.
#[derive(Parser, Debug)]
pub struct UpdateRuleCommand {
    /// Id of the rule to update.
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long, value_name = "NAME", help = "New rule name.")]
    pub name: Option<String>,

    #[arg(long, value_name = "PATTERN", help = "New regex pattern.")]
    pub condition: Option<String>,

    #[arg(long, value_enum, help = "New action.")]
    pub action: Option<ActionArg>,

    #[arg(long, value_name = "TEXT", help = "New replacement text.")]
    pub replacement: Option<String>,

    #[arg(long, value_name = "TEXT", help = "New description.")]
    pub description: Option<String>,

    #[arg(long, value_name = "N", help = "New priority (0-100).")]
    pub priority: Option<u8>,
}

/// Subcommands for the `sets` command.
#[derive(Subcommand, Debug)]
pub enum SetsCommand {
    /// Lists every rule set.
    #[command(about = "Lists every rule set.")]
    List {
        /// Print the rule sets as JSON instead of a table.
        #[arg(long, help = "Print the rule sets as JSON instead of a table.")]
        json: bool,
    },

    /// Prints one rule set as JSON.
    #[command(about = "Prints one rule set as JSON.")]
    Get {
        /// Id of the rule set to print.
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Adds a named rule set.
    #[command(about = "Adds a named rule set.")]
    Add(AddSetCommand),

    /// Removes a rule set (the default set is protected).
    #[command(about = "Removes a rule set (the default set is protected).")]
    Rm {
        /// Id of the rule set to remove.
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Makes a rule set the default for `process`.
    #[command(name = "set-default", about = "Makes a rule set the default for `process`.")]
    SetDefault {
        /// Id of the rule set to promote.
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Arguments for `sets add`.
#[derive(Parser, Debug)]
pub struct AddSetCommand {
    /// Human-readable set name.
    #[arg(long, value_name = "NAME", help = "Human-readable set name.")]
    pub name: String,

    /// Explicit set id (derived from the name when omitted).
    #[arg(long, value_name = "ID", help = "Explicit set id (derived from the name when omitted).")]
    pub id: Option<String>,

    /// Free-form description.
    #[arg(long, value_name = "TEXT", default_value = "", help = "Free-form description.")]
    pub description: String,

    /// Member rule ids (comma-separated).
    #[arg(long, value_name = "IDS", value_delimiter = ',', help = "Member rule ids (comma-separated).")]
    pub rules: Vec<String>,
}

/// Rule action as a CLI flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    /// Replace matches with the replacement text.
    Redact,
    /// Report matches without changing the text.
    Flag,
    /// Report matches and mark the result blocked.
    Block,
    /// Rewrite matches, reported as a transform.
    Transform,
}

impl From<ActionArg> for RuleAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Redact => RuleAction::Redact,
            ActionArg::Flag => RuleAction::Flag,
            ActionArg::Block => RuleAction::Block,
            ActionArg::Transform => RuleAction::Transform,
        }
    }
}
