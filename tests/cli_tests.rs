//! Integration tests for the action-form CLI
//!
//! These tests run the actual binary against the fixture schema.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SCHEMA: &str = "tests/fixtures/review-schema.json";
const SCRIPT: &str = "tests/fixtures/review-replay.yaml";

/// Binary with an isolated, empty config
fn action_form_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("action-form").unwrap();
    cmd.env_remove("ACTION_FORM_THEME")
        .env_remove("ACTION_FORM_LANGUAGE")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_dir.path().join("config.toml"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("replay"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_fixture_schema() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args(["validate", SCHEMA])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("inputs: 2"))
        .stdout(predicate::str::contains("outcomes: Approve, Reject"));
}

#[test]
fn test_validate_rejects_schema_without_outcomes() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("bad.json");
    fs::write(
        &schema,
        r#"{ "outputs": { "type": "object", "properties": { "c": { "type": "string" } } } }"#,
    )
    .unwrap();

    action_form_cmd(&dir)
        .args(["validate", schema.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AF-002"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_validate_rejects_reserved_field_name() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("reserved.json");
    fs::write(
        &schema,
        r#"{
            "inputs": { "type": "object", "properties": { "Id": { "type": "string" } } },
            "outcomes": { "type": "object", "properties": { "Approve": { "type": "string" } } }
        }"#,
    )
    .unwrap();

    action_form_cmd(&dir)
        .args(["validate", schema.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AF-004"));
}

#[test]
fn test_validate_missing_file() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args(["validate", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read schema"));
}

// ============================================================================
// preview
// ============================================================================

#[test]
fn test_preview_shows_defaults_and_banner() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args(["preview", SCHEMA, "--data", r#"{"patientName": "Sarah Johnson"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Preview:"))
        .stdout(predicate::str::contains("patientName* [text] (locked): Sarah Johnson"))
        .stdout(predicate::str::contains("[theme: light, language: en]"));
}

#[test]
fn test_preview_edits_and_completes_through_fallback() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args([
            "preview",
            SCHEMA,
            "--set",
            "reviewerComments=looks fine",
            "--set",
            "approvedDays=3.7",
            "--complete",
            "Approve",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("reviewerComments* [textarea]: looks fine"))
        .stdout(predicate::str::contains("approvedDays [integer]: 4"))
        .stdout(predicate::str::contains("Task completed with outcome 'Approve'"));
}

#[test]
fn test_preview_refuses_bad_input() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args(["preview", SCHEMA, "--set", "approvedDays=many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AF-015"));
}

#[test]
fn test_preview_rejects_non_object_data() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args(["preview", SCHEMA, "--data", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AF-014"));
}

#[test]
fn test_preview_uses_config_and_env_settings() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[preview]\ntheme = \"dark\"\nlanguage = \"de\"\n",
    )
    .unwrap();

    action_form_cmd(&dir)
        .env("ACTION_FORM_LANGUAGE", "fr")
        .args(["preview", SCHEMA])
        .assert()
        .success()
        .stdout(predicate::str::contains("[theme: dark, language: fr]"));
}

#[test]
fn test_preview_json_output() {
    let dir = TempDir::new().unwrap();
    let output = action_form_cmd(&dir)
        .args(["preview", SCHEMA, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let page: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page["sections"].as_array().unwrap().len(), 3);
    assert_eq!(page["buttons"][0]["label"], "Approve");
}

// ============================================================================
// replay
// ============================================================================

#[test]
fn test_replay_prints_transcript() {
    let dir = TempDir::new().unwrap();
    action_form_cmd(&dir)
        .args(["replay", SCHEMA, SCRIPT])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replaying 5 steps"))
        .stdout(predicate::str::contains("\"type\":\"host_data_applied\""))
        .stdout(predicate::str::contains("\"call\":\"complete_task\""))
        .stdout(predicate::str::contains("step 4:"))
        .stdout(predicate::str::contains("[theme: dark, language: en]"));
}

#[test]
fn test_replay_bad_script() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("bad.yaml");
    fs::write(&script, "steps:\n  - explode: true\n").unwrap();

    action_form_cmd(&dir)
        .args(["replay", SCHEMA, script.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load script"));
}
