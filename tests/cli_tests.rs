//! Binary-level tests for argument handling and startup failures.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_config_flag() {
    Command::cargo_bin("arbit")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn missing_config_file_exits_nonzero() {
    Command::cargo_bin("arbit")
        .unwrap()
        .args(["--config", "/definitely/not/here.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn malformed_config_exits_nonzero() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"venues = \"not a table\"\n").unwrap();

    Command::cargo_bin("arbit")
        .unwrap()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
