//! Integration tests for the sparkctl command surface.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn sparkctl() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sparkctl"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    sparkctl().assert().code(2).stderr(predicate::str::contains(
        "Provision an EC2 Hadoop/Spark cluster",
    ));
}

#[test]
fn test_cli_help_lists_every_stage() {
    let output = sparkctl().arg("--help").output().expect("run");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for stage in ["provision", "network", "deploy", "bench", "up", "status", "config"] {
        assert!(help.contains(stage), "missing {stage} in:\n{help}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    sparkctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sparkctl"));
}

#[test]
fn test_version_command_shows_version() {
    sparkctl()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sparkctl v0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = sparkctl()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["version"], "0.1.0");
}

#[test]
fn test_quiet_version_prints_nothing() {
    sparkctl()
        .args(["version", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unknown_subcommand_fails() {
    sparkctl()
        .arg("teardown")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_verbose_flag_is_accepted_anywhere() {
    sparkctl().args(["-vv", "version"]).assert().success();
    sparkctl().args(["version", "-v"]).assert().success();
}
