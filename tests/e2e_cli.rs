
use assert_cmd::{cargo, prelude::*};
use cli_helpers::{base_cmd, latest_path, run_cmd, write_config};
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("gold_page.html")
}

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

#[test]
fn parse_prints_records_without_config() {
    let home = setup_temp_home();

    let mut cmd = base_cmd(&home);
    cmd.arg("parse").arg(fixture());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Vàng nhẫn khâu 9999"))
        .stdout(predicate::str::contains("8.450.000 ₫"))
        .stdout(predicate::str::contains("Vàng trắng").not())
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn parse_json_outputs_snapshot_array() {
    let home = setup_temp_home();

    let output = base_cmd(&home)
        .arg("--json")
        .arg("parse")
        .arg(fixture())
        .output()
        .expect("failed to run goldwatch");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let records = json.as_array().expect("snapshot should be an array");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["type"], "Vàng nhẫn khâu 9999");
    assert_eq!(records[0]["buy"], 8450);
}

#[test]
fn missing_config_is_fatal() {
    let home = setup_temp_home();

    let mut cmd = Command::new(cargo::cargo_bin!("goldwatch"));
    cmd.env("HOME", home.path())
        .current_dir(home.path())
        .arg("--no-color")
        .arg("--config")
        .arg(home.path().join("absent.toml"))
        .arg("latest");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn latest_on_first_run_is_empty() {
    let home = setup_temp_home();
    let config = write_config(&home);

    let output = run_cmd(&home, &config, &["latest"]).expect("latest should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No snapshot found"));
    assert!(!latest_path(&home).exists());
}

#[test]
fn latest_shows_stored_snapshot() {
    let home = setup_temp_home();
    let config = write_config(&home);

    std::fs::create_dir_all(latest_path(&home).parent().unwrap()).unwrap();
    std::fs::write(
        latest_path(&home),
        r#"[{"type":"Vàng 18K","buy":6120,"sell":6370,"converted":"",
            "updated_at":"2025-03-01T08:00:00+07:00"}]"#,
    )
    .unwrap();

    let output = run_cmd(&home, &config, &["latest"]).expect("latest should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Vàng 18K"));
    assert!(stdout.contains("6.370.000 ₫"));
}

#[test]
fn history_on_empty_database() {
    let home = setup_temp_home();
    let config = write_config(&home);

    let output = run_cmd(&home, &config, &["history", "--limit", "5"])
        .expect("history should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("No history found"));
}
