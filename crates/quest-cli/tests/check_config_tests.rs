//! End-to-end tests for the quest CLI configuration surface
//!
//! These run the real binary; commands that would touch the network or an
//! object store are exercised elsewhere against mocked backends.

use assert_cmd::Command;
use predicates::prelude::*;

fn quest() -> Command {
    let mut cmd = Command::cargo_bin("quest").unwrap();
    // Start from a clean slate so the developer's environment never leaks in
    cmd.env_remove("REARC_BUCKET")
        .env_remove("QUEST_VISIBILITY_TIMEOUT")
        .env_remove("QUEST_TASK_TIMEOUT");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    quest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_no_subcommand_shows_usage() {
    quest().assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_check_config_reports_effective_values() {
    quest()
        .arg("check-config")
        .env("REARC_BUCKET", "quest-test-bucket")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("quest-test-bucket"))
        .stdout(predicate::str::contains("910s"));
}

#[test]
fn test_check_config_requires_bucket() {
    quest()
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("REARC_BUCKET"));
}

#[test]
fn test_check_config_rejects_visibility_timeout_at_task_timeout() {
    quest()
        .arg("check-config")
        .env("REARC_BUCKET", "quest-test-bucket")
        .env("QUEST_VISIBILITY_TIMEOUT", "900")
        .assert()
        .failure()
        .stderr(predicate::str::contains("visibility timeout"));
}
