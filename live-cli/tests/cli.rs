//! Command-line behaviour of the `repeater-live` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("repeater-live").unwrap();
    cmd.current_dir(dir.path())
        .arg("--data-dir")
        .arg(dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("lang"));
}

#[test]
fn lang_is_persisted() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["lang"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Language not set"));

    cli(&dir)
        .args(["lang", "RO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Language set to ro"));

    cli(&dir)
        .args(["lang"])
        .assert()
        .success()
        .stdout(predicate::str::diff("ro\n"));

    assert!(dir.path().join("viewer.json").exists());
}

#[test]
fn set_rejects_bad_assignment() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--device", "127.0.0.1", "set", "userLockActive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid preference assignment"));
}

#[test]
fn status_needs_a_device() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no device configured"));
}

#[test]
fn status_reports_unreachable_device() {
    let dir = TempDir::new().unwrap();
    // Nothing listens on port 1
    cli(&dir)
        .args(["--device", "http://127.0.0.1:1/", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch status"));
}

#[test]
fn watch_rejects_unknown_field() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--device", "127.0.0.1", "watch", "--fields", "volume"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field 'volume'"));
}

#[test]
fn bad_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("repeater-live.toml"), "[sync\n").unwrap();
    cli(&dir)
        .arg("lang")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}
