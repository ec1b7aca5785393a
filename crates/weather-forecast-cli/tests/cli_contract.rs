use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn run_cli(args: &[&str], app_dir: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_weather"));
    cmd.args(args)
        .env("WEATHER_APP_DIR", app_dir)
        .env("WEATHER_LOG", "off")
        .env("NO_COLOR", "1");
    cmd.output().expect("run weather")
}

#[test]
fn forecast_without_init_reports_missing_config_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_cli(&["forecast", "Berlin", "--json"], dir.path());

    assert_eq!(output.status.code(), Some(3));
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(
        json.get("schema_version").and_then(Value::as_str),
        Some("v1")
    );
    assert_eq!(
        json.get("command").and_then(Value::as_str),
        Some("weather.forecast")
    );
    assert_eq!(json.get("ok").and_then(Value::as_bool), Some(false));
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("config.missing")
    );
    assert_eq!(
        json.pointer("/error/details/exit_code")
            .and_then(Value::as_i64),
        Some(3)
    );
    assert!(
        json.pointer("/error/message")
            .and_then(Value::as_str)
            .is_some_and(|message| message.contains("weather init"))
    );
}

#[test]
fn forecast_without_init_prints_human_error_to_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_cli(&["forecast", "Berlin"], dir.path());

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error[config.missing]:"));
}

#[test]
fn init_writes_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_cli(&["init", "--access-key", "key-123", "--json"], dir.path());

    assert_eq!(output.status.code(), Some(0));
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(
        json.get("command").and_then(Value::as_str),
        Some("weather.init")
    );

    let saved: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("config.json")).expect("config"),
    )
    .expect("config json");
    assert_eq!(
        saved
            .get("positionstack_access_key")
            .and_then(Value::as_str),
        Some("key-123")
    );
}

#[test]
fn corrupted_config_is_reported_separately() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("config.json"), "not json").expect("write");

    let output = run_cli(&["forecast", "Berlin", "--json"], dir.path());

    assert_eq!(output.status.code(), Some(3));
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("config.corrupted")
    );
}

#[test]
fn invalid_day_count_is_a_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_cli(&["forecast", "Berlin", "--days", "30", "--json"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("user.invalid_input")
    );
}

#[test]
fn help_lists_both_commands() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_cli(&["--help"], dir.path());

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("init"));
    assert!(stdout.contains("forecast"));
}
