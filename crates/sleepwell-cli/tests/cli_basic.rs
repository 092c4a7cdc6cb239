//! Basic CLI E2E tests.
//!
//! Tests invoke the built `sleepwell` binary against a throwaway config
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_sleepwell"))
        .args(args)
        .env("SLEEPWELL_CONFIG_DIR", dir)
        .env_remove("SLEEPWELL_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_config_get_default() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "alarm.time"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "07:00");
    assert!(dir.path().join("config.toml").exists(), "defaults not written");
}

#[test]
fn test_config_set_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "pomodoro.work_minutes", "50"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "pomodoro.work_minutes"]);
    assert_eq!(stdout.trim(), "50");
}

#[test]
fn test_config_set_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "lighting.color", "red"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "lighting.color"]);
    assert_eq!(stdout.trim(), "#CC0000");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "lighting.fade_duration_minutes", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("lighting.fade_duration_minutes"));
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "lighting.fade_duration_minutes"]);
    assert_eq!(stdout.trim(), "15");
}

#[test]
fn test_config_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "nope.nothing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_list_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "alarm.auto_rearm", "true"]);

    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("alarm.auto_rearm = true"));
    assert!(stdout.contains("lighting.fade_duration_minutes = 15"));

    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let json = run_json(dir.path(), &["config", "list", "--json"]);
    assert_eq!(json["alarm"]["auto_rearm"], false);
}

#[test]
fn test_circadian_json() {
    let dir = tempfile::tempdir().unwrap();
    let json = run_json(
        dir.path(),
        &["circadian", "--chronotype", "wolf", "--at", "22:30", "--json"],
    );
    assert_eq!(json["profile"]["name"], "Wolf");
    assert_eq!(json["time"], "22:30");
    assert!(json["advice"]["quick_actions"].as_array().is_some());
    assert_eq!(json["energy_curve"].as_array().unwrap().len(), 24);
}

#[test]
fn test_circadian_text_chart() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["circadian", "--at", "10:00"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Bear Energy Curve"));
    assert!(stdout.contains("◀ now"));
}

#[test]
fn test_presets() {
    let dir = tempfile::tempdir().unwrap();
    let json = run_json(dir.path(), &["presets", "--kind", "wake", "--json"]);
    let palettes = json.as_array().unwrap();
    assert_eq!(palettes.len(), 1);
    assert_eq!(palettes[0]["kind"], "Wake");
    assert_eq!(palettes[0]["presets"][0]["name"], "Sunrise Orange");
    assert_eq!(palettes[0]["presets"][0]["color"], "#FF6B35");
}

#[test]
fn test_sounds_list() {
    let dir = tempfile::tempdir().unwrap();
    let json = run_json(dir.path(), &["sounds", "list", "--json"]);
    let sounds = json.as_array().unwrap();
    let birds = sounds.iter().find(|s| s["id"] == "birds").unwrap();
    assert_eq!(birds["available"], false);
    assert!(birds["path"].as_str().unwrap().ends_with("morning-birds.mp3"));
}

#[test]
fn test_sounds_list_survives_broken_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[sounds\nasset_dir = ").unwrap();
    let json = run_json(dir.path(), &["sounds", "list", "--json"]);
    let rain = json
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "rain")
        .unwrap();
    assert!(rain["path"].as_str().unwrap().ends_with("rain.mp3"));

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "alarm.time"]);
    assert_eq!(code, 1, "strict commands still reject the file");
    assert!(stderr.contains("error:"));
}

#[test]
fn test_invalid_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["alarm", "--at", "25:00"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["focus", "--session", "nap"]);
    assert_ne!(code, 0);
    let (_, stderr, code) = run_cli(dir.path(), &["sounds", "play", "kazoo", "--mute"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("kazoo"));
}
