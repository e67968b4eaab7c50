use crate::common::fixtures_dir;
use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;
use yaml_include::constants::CONFIG_ENV_VAR;
use yaml_include::test_utils::{init_test_logging, write_fixture};

fn yaml_include() -> Command {
    let mut cmd = Command::cargo_bin("yaml-include").unwrap();
    cmd.env_remove("RUST_LOG").env_remove(CONFIG_ENV_VAR);
    cmd
}

#[test]
fn test_resolves_relative_to_input_file() {
    init_test_logging(None);
    yaml_include()
        .arg(fixtures_dir().join("0.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("file1:\n  name: '1'\n"))
        .stdout(predicate::str::contains("- name: '2'"));
}

#[test]
fn test_json_output() {
    let output = yaml_include()
        .arg(fixtures_dir().join("0.yaml"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["file1"]["name"], "1");
    assert_eq!(json["files"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_no_autoload_keeps_tags() {
    yaml_include()
        .arg(fixtures_dir().join("0.yaml"))
        .arg("--no-autoload")
        .assert()
        .success()
        .stdout(predicate::str::contains("file1: !inc include.d/1.yaml"));
}

#[test]
fn test_stdin_with_base_dir() {
    yaml_include()
        .args(["-", "--base-dir"])
        .arg(fixtures_dir())
        .write_stdin("x: !inc include.d/2.yaml\n")
        .assert()
        .success()
        .stdout("x:\n  name: '2'\n");
}

#[test]
fn test_readers_flag() {
    yaml_include()
        .args(["-", "--readers", "-b"])
        .arg(fixtures_dir())
        .write_stdin("t: !inc formats/a.toml\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("title: toml"));
}

#[test]
fn test_missing_include_reports_error() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "doc.yaml", "a: !inc nowhere.yaml\n");

    yaml_include()
        .arg(temp.path().join("doc.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Included file not found"))
        .stderr(predicate::str::contains("nowhere.yaml"))
        .stderr(predicate::str::contains("default:"));
}

#[test]
fn test_missing_input_file() {
    yaml_include().arg("does-not-exist.yaml").assert().failure().code(1);
}

#[test]
#[serial]
fn test_config_file_from_environment() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "cfg.toml", "tag = 'include'\n");
    write_fixture(temp.path(), "doc.yaml", "a: !include part.yaml\n");
    write_fixture(temp.path(), "part.yaml", "value: 7\n");

    yaml_include()
        .arg(temp.path().join("doc.yaml"))
        .env(CONFIG_ENV_VAR, temp.path().join("cfg.toml"))
        .assert()
        .success()
        .stdout("a:\n  value: 7\n");
}

#[test]
#[serial]
fn test_flags_override_config_file() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "cfg.toml", "tag = 'include'\nautoload = true\n");
    write_fixture(temp.path(), "doc.yaml", "a: !inc part.yaml\n");
    write_fixture(temp.path(), "part.yaml", "value: 7\n");

    yaml_include()
        .arg(temp.path().join("doc.yaml"))
        .arg("--config")
        .arg(temp.path().join("cfg.toml"))
        .args(["--tag", "inc", "--no-autoload"])
        .assert()
        .success()
        .stdout(predicate::str::contains("!inc part.yaml"));
}

#[test]
#[serial]
fn test_invalid_config_file() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "cfg.toml", "autolaod = true\n");

    yaml_include()
        .arg(fixtures_dir().join("0.yaml"))
        .arg("--config")
        .arg(temp.path().join("cfg.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cfg.toml"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    yaml_include()
        .arg(fixtures_dir().join("0.yaml"))
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains("Including"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    yaml_include()
        .args(["doc.yaml", "-v", "-q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
