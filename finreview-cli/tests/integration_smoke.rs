//! Smoke tests to verify command wiring

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};

/// Command isolated from the caller's environment and home directory.
fn finreview(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("finreview").unwrap();
    cmd.env_remove("DATABASE_URL")
        .env_remove("FINREVIEW_BIND")
        .env_remove("FINREVIEW_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", home.path())
        .current_dir(home.path());
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

// === Help ===

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("check-config"))
        .stdout(predicate::str::contains("validate-balance"));
}

#[test]
fn test_serve_help() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--cors-permissive"))
        .stdout(predicate::str::contains("--database-url"));
}

// === Balance ===

#[test]
fn test_validate_balance_ok() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .args(["validate-balance", "--debits", "1500", "--credits", "1500.00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trial balance is valid"));
}

#[test]
fn test_validate_balance_out_of_balance() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .args(["validate-balance", "--debits", "100", "--credits", "90"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("debits exceed credits by 10.00"));
}

#[test]
fn test_validate_balance_json() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .args(["validate-balance", "--debits", "10", "--credits", "10", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"isValid\": true"));
}

// === Config ===

#[test]
fn test_check_config_reads_file() {
    let home = TempDir::new().unwrap();
    let file = config_file(
        "[analysis]\nmin_pct_change = 15.0\n\n[database]\nurl = \"postgres://app:hunter2@db/finreview\"\n",
    );
    finreview(&home)
        .arg("check-config")
        .arg("--config")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("min_pct_change = 15.0"))
        .stdout(predicate::str::contains("postgres://app:***@db/finreview"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_check_config_rejects_bad_bind() {
    let home = TempDir::new().unwrap();
    let file = config_file("[server]\nbind = \"not-an-address\"\n");
    finreview(&home)
        .arg("check-config")
        .arg("--config")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_check_config_missing_file() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .args(["check-config", "--config", "/definitely/not/here.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

// === Server ===

#[test]
fn test_serve_requires_database_url() {
    let home = TempDir::new().unwrap();
    finreview(&home)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}
