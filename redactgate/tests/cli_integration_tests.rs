// redactgate/tests/cli_integration_tests.rs
//! Command-line integration tests for the `redactgate` binary.
//!
//! These tests execute the real executable with `assert_cmd`, each against
//! its own temporary registry file so runs stay isolated. They cover
//! processing stdin and files through the default rules, the report/JSON
//! output modes, block handling, and registry management via the `rules`
//! and `sets` subcommands.
//!
//! `RUST_LOG=debug` is set for the spawned process so internal logging is
//! visible in test output; logs go to stderr and never pollute the
//! processed text on stdout.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Runs the `redactgate` binary against a per-test registry file, feeding
/// `input` on stdin, and returns the assertion handle.
fn run_redactgate(registry: &Path, input: &str, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("redactgate").unwrap();
    cmd.env("RUST_LOG", "debug");
    cmd.arg("--registry").arg(registry);
    cmd.args(args);
    cmd.write_stdin(input.as_bytes());
    cmd.assert()
}

#[test]
fn test_process_redacts_default_patterns() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(
        &registry,
        "My email is test@example.com and my IP is 192.168.1.1.",
        &["process"],
    )
    .success()
    .stdout("My email is <EMAIL> and my IP is <IP_ADDRESS>.");
    Ok(())
}

#[test]
fn test_process_reads_input_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    let mut file = NamedTempFile::new()?;
    file.write_all(b"ip 10.0.0.1 end")?;

    run_redactgate(
        &registry,
        "",
        &["process", "-i", file.path().to_str().unwrap()],
    )
    .success()
    .stdout("ip <IP_ADDRESS> end");
    Ok(())
}

#[test]
fn test_process_report_writes_matches_to_stderr() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(
        &registry,
        "reach me at test@example.com",
        &["process", "--report"],
    )
    .success()
    .stdout("reach me at <EMAIL>")
    .stderr(predicate::str::contains("\"kind\": \"match\""))
    .stderr(predicate::str::contains("\"rule_id\": \"email\""));
    Ok(())
}

#[test]
fn test_process_json_emits_full_result() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(&registry, "ssn 123-45-6789", &["process", "--json"])
        .success()
        .stdout(predicate::str::contains("\"redacted_text\": \"ssn <SSN>\""))
        .stdout(predicate::str::contains("\"blocked\": false"));
    Ok(())
}

#[test]
fn test_process_fail_on_block() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");
    let input = "this is sh*t";

    run_redactgate(&registry, input, &["process", "--fail-on-block"])
        .failure()
        .stderr(predicate::str::contains("Blocked by rule: Profanity Block"));

    // Without the flag a blocked result still passes the text through.
    run_redactgate(&registry, input, &["process"])
        .success()
        .stdout("this is sh*t");
    Ok(())
}

#[test]
fn test_rules_add_list_rm_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(
        &registry,
        "",
        &[
            "rules",
            "add",
            "--name",
            "Order Id",
            "--condition",
            r"ORD-\d+",
        ],
    )
    .success()
    .stdout(predicate::str::contains("\"id\": \"order_id\""));

    run_redactgate(&registry, "", &["rules", "list"])
        .success()
        .stdout(predicate::str::contains("order_id"));

    // The new rule joined the default set, so `process` picks it up.
    run_redactgate(&registry, "ticket ORD-99", &["process"])
        .success()
        .stdout("ticket <ORDER_ID>");

    run_redactgate(&registry, "", &["rules", "rm", "order_id"])
        .success()
        .stdout(predicate::str::contains("Removed rule 'order_id'."));
    run_redactgate(&registry, "", &["rules", "get", "order_id"])
        .failure()
        .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn test_rules_disable_and_enable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(&registry, "", &["rules", "disable", "email"])
        .success()
        .stdout(predicate::str::contains("disabled"));
    run_redactgate(&registry, "a@b.org", &["process"])
        .success()
        .stdout("a@b.org");

    run_redactgate(&registry, "", &["rules", "enable", "email"]).success();
    run_redactgate(&registry, "a@b.org", &["process"])
        .success()
        .stdout("<EMAIL>");
    Ok(())
}

#[test]
fn test_sets_add_and_set_default() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(
        &registry,
        "",
        &["sets", "add", "--name", "Strict", "--rules", "ssn"],
    )
    .success()
    .stdout(predicate::str::contains("\"id\": \"strict\""));
    run_redactgate(&registry, "", &["sets", "set-default", "strict"]).success();

    // The strict set only knows about SSNs; emails pass through now.
    run_redactgate(
        &registry,
        "mail: test@example.com ssn: 123-45-6789",
        &["process"],
    )
    .success()
    .stdout("mail: test@example.com ssn: <SSN>");

    // Naming a set explicitly still reaches the full default rules.
    run_redactgate(
        &registry,
        "mail: test@example.com",
        &["process", "--rule-set", "default"],
    )
    .success()
    .stdout("mail: <EMAIL>");
    Ok(())
}

#[test]
fn test_unknown_rule_set_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(&registry, "x", &["process", "--rule-set", "nope"])
        .failure()
        .stderr(predicate::str::contains("'nope' not found"));
    Ok(())
}

#[test]
fn test_health_reports_ok() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = dir.path().join("rules.json");

    run_redactgate(&registry, "", &["health"])
        .success()
        .stdout(predicate::str::contains("\"status\": \"ok\""))
        .stdout(predicate::str::contains("\"version\""));
    Ok(())
}
