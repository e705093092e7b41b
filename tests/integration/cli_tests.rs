//! Integration tests for the CLI binary.
//!
//! Verifies that the `awsident` binary responds to basic flags and drives
//! the identity store through a temporary `--config-dir`.
//!
//! This test is registered as a [[test]] in the aws-identity-cli crate
//! so that CARGO_BIN_EXE_awsident is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `awsident` binary.
fn awsident_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_awsident"))
}

/// Run `awsident --config-dir DIR ARGS...`.
fn run(config_dir: &Path, args: &[&str]) -> Output {
    awsident_binary()
        .arg("--config-dir")
        .arg(config_dir)
        .args(args)
        .output()
        .expect("failed to execute awsident")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = awsident_binary()
        .arg("--help")
        .output()
        .expect("failed to execute awsident --help");

    assert!(
        output.status.success(),
        "awsident --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = stdout(&output);
    assert!(
        stdout.contains("awsident") || stdout.contains("Usage"),
        "awsident --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = awsident_binary()
        .arg("--version")
        .output()
        .expect("failed to execute awsident --version");

    assert!(output.status.success());
    assert!(stdout(&output).contains("awsident"));
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = awsident_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute awsident");

    assert!(
        !output.status.success(),
        "awsident with unknown flag should exit with error"
    );
}

#[test]
fn cli_add_list_rename_remove() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("registry");

    let empty = run(&config_dir, &["list"]);
    assert!(empty.status.success());
    assert!(stdout(&empty).contains("No identities stored."));

    for name in ["zoe", "adam"] {
        let added = run(
            &config_dir,
            &[
                "add",
                "--name",
                name,
                "--access-key-id",
                "AKIAEXAMPLE",
                "--secret-access-key",
                "wJalrXUtnFEMIK7MDENG",
            ],
        );
        assert!(added.status.success());
    }

    let listed = stdout(&run(&config_dir, &["list"]));
    let keys: Vec<&str> = listed.lines().collect();
    assert_eq!(keys, vec!["adam", "zoe"]);

    let shown = stdout(&run(&config_dir, &["show", "adam"]));
    assert!(shown.contains("****DENG"));
    assert!(!shown.contains("wJalrXUtnFEMIK7MDENG"));

    let revealed = stdout(&run(&config_dir, &["show", "adam", "--reveal"]));
    assert!(revealed.contains("wJalrXUtnFEMIK7MDENG"));

    assert!(run(&config_dir, &["rename", "zoe", "zoe-prod"]).status.success());
    let listed = stdout(&run(&config_dir, &["list"]));
    assert_eq!(listed.lines().collect::<Vec<_>>(), vec!["adam", "zoe-prod"]);

    assert!(run(&config_dir, &["remove", "adam"]).status.success());
    let missing = run(&config_dir, &["show", "adam"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("not found"));
}

#[test]
fn cli_skip_existing_handles_duplicate_rows_in_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("registry");
    let csv = dir.path().join("credentials.csv");
    std::fs::write(&csv, "header\nAlice,AKIA1,S1\nAlice,AKIA2,S2\nBob,AKIA3,S3\n").unwrap();

    let output = run(&config_dir, &["import", "--skip-existing", csv.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Imported 2"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Skipped 'Alice'"));

    let file = std::fs::read(config_dir.join("identities.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&file).unwrap();
    assert_eq!(value["Alice"]["access_key_id"], "AKIA1");
    assert_eq!(value["Bob"]["access_key_id"], "AKIA3");
}

#[test]
fn cli_uses_home_override_without_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("home-override");

    let added = awsident_binary()
        .env("AWS_IDENTITY_MANAGER_HOME", &home)
        .args([
            "add",
            "--name",
            "carol",
            "--access-key-id",
            "AKIAC",
            "--secret-access-key",
            "carolsecret",
        ])
        .output()
        .expect("failed to execute awsident");
    assert!(added.status.success());
    assert!(home.join("identities.json").exists());
}

#[test]
fn cli_import_conflict_and_skip_existing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("registry");
    let csv = dir.path().join("credentials.csv");
    std::fs::write(&csv, "User name,Access key ID,Secret access key\nAlice,AKIA123,SECRET456\n")
        .unwrap();

    let imported = run(&config_dir, &["import", csv.to_str().unwrap()]);
    assert!(imported.status.success());
    assert!(stdout(&imported).contains("Imported 1"));

    std::fs::write(
        &csv,
        "User name,Access key ID,Secret access key\nAlice,AKIA123,ROTATED\nBob,AKIA789,SECRET000\n",
    )
    .unwrap();

    let conflicting = run(&config_dir, &["import", csv.to_str().unwrap()]);
    assert!(!conflicting.status.success());

    let skipped = run(&config_dir, &["import", "--skip-existing", csv.to_str().unwrap()]);
    assert!(skipped.status.success());
    assert!(stdout(&skipped).contains("Imported 1"));

    let file = std::fs::read(config_dir.join("identities.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&file).unwrap();
    assert_eq!(value["Alice"]["secret_access_key"], "SECRET456");
    assert_eq!(value["Bob"]["access_key_id"], "AKIA789");
}
