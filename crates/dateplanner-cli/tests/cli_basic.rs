//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory, so invocations share state the way page loads share storage.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_dateplanner-cli"))
        .args(args)
        .env("DATEPLANNER_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_fresh_status_opens_first_stage() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["status"]);

    let stages = status["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 5);
    assert_eq!(stages[0]["state"], "UNLOCKED");
    assert_eq!(stages[0]["id"], "coffee");
    assert!(stages[1..].iter().all(|s| s["state"] == "LOCKED"));
    assert!(status["countdown"].is_null());
    assert_eq!(status["current_step"], "intro-1");
    assert_eq!(status["finished"], false);
}

#[test]
fn test_confirm_starts_countdown_for_next_stage() {
    let dir = tempfile::tempdir().unwrap();

    let selected = run_json(dir.path(), &["stage", "select", "0"]);
    assert_eq!(selected["state"], "SELECTED");
    assert!(selected["selected_index"].as_u64().unwrap() < 4);

    let confirmed = run_json(dir.path(), &["stage", "confirm", "0"]);
    assert_eq!(confirmed["state"], "CONFIRMED");
    assert_eq!(confirmed["selected_index"], selected["selected_index"]);

    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["countdown"]["target"], 1);
    assert!(status["countdown"]["remaining_ms"].as_u64().unwrap() <= 30_000);
    assert_eq!(status["stages"][1]["state"], "LOCKED");
}

#[test]
fn test_invalid_operation_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(dir.path(), &["stage", "select", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Cannot select stage 1 while it is locked"));

    let (_, stderr, code) = run_cli(dir.path(), &["stage", "confirm", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unlocked"));

    let (_, _, code) = run_cli(dir.path(), &["stage", "show", "9"]);
    assert_eq!(code, 1);
}

#[test]
fn test_zero_delay_unlocks_on_next_load() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "timing.delay_ms", "0"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    run_json(dir.path(), &["stage", "select", "0"]);
    run_json(dir.path(), &["stage", "confirm", "0"]);

    let stage = run_json(dir.path(), &["stage", "show", "1"]);
    assert_eq!(stage["state"], "UNLOCKED");
    assert_eq!(stage["id"], "walk");

    let summary = run_json(dir.path(), &["summary"]);
    assert_eq!(summary["entries"].as_array().unwrap().len(), 1);
    assert_eq!(summary["entries"][0]["stage_id"], "coffee");
    assert_eq!(summary["complete"], false);
}

#[test]
fn test_retry_relocks_later_stages() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "timing.delay_ms", "0"]);

    for stage in ["0", "1"] {
        run_json(dir.path(), &["stage", "select", stage]);
        run_json(dir.path(), &["stage", "confirm", stage]);
    }

    let retried = run_json(dir.path(), &["stage", "retry", "0"]);
    assert_eq!(retried["state"], "UNLOCKED");

    let status = run_json(dir.path(), &["status"]);
    let stages = status["stages"].as_array().unwrap();
    assert!(stages[1..].iter().all(|s| s["state"] == "LOCKED"));
    assert!(status["countdown"].is_null());
}

#[test]
fn test_intro_screens_are_persisted() {
    let dir = tempfile::tempdir().unwrap();

    let view = run_json(dir.path(), &["intro", "screen", "intro-3"]);
    assert_eq!(view["current_step"], "intro-3");
    assert_eq!(view["intro_completed"], false);

    run_json(dir.path(), &["intro", "complete"]);
    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["intro_completed"], true);
    assert_eq!(status["current_step"], "stages");
}

#[test]
fn test_restart_discards_progress() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["stage", "select", "0"]);
    run_json(dir.path(), &["stage", "confirm", "0"]);

    let view = run_json(dir.path(), &["restart"]);
    assert_eq!(view["stages"][0]["state"], "UNLOCKED");
    assert!(view["countdown"].is_null());

    let summary = run_json(dir.path(), &["summary"]);
    assert!(summary["entries"].as_array().unwrap().is_empty());
}

#[test]
fn test_watch_without_countdown_returns_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["watch"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("no countdown running"));
    let view: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(view["stages"][0]["state"], "UNLOCKED");
}

#[test]
fn test_config_commands() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timing.delay_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30000");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "timing.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timing.tick_ms", "0"]);
    assert_eq!(code, 1);

    let list = run_json(dir.path(), &["config", "list"]);
    assert_eq!(list["timing"]["tick_ms"], 1000);
    assert_eq!(list["storage"]["state_key"], "dateplanner_state_v2");

    run_cli(dir.path(), &["config", "set", "timing.delay_ms", "5"]);
    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timing.delay_ms"]);
    assert_eq!(stdout.trim(), "30000");
}

#[test]
fn test_invalid_config_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[storage]\nstate_key = \"same\"\nuser_id_key = \"same\"\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(dir.path(), &["status"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error: Configuration error:"));
    assert!(stderr.contains("state and user id keys must differ"));
}
