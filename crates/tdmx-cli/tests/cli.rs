//! Command-line behaviour of the `tdmx-ca` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const PASSPHRASE: &str = "open sesame";

fn tdmx_ca(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tdmx-ca").unwrap();
    cmd.env("TDMX_CA_CONFIG", dir.join("config.toml"))
        .env("TDMX_KEYSTORE_PASSPHRASE", PASSPHRASE)
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

/// zone example.com, domain example.com, user alice
fn issue_hierarchy(dir: &TempDir) {
    let path = dir.path();
    tdmx_ca(path)
        .args(["zone", "create", "example.com", "--unit", "Messaging", "--out-dir"])
        .arg(path)
        .assert()
        .success()
        .stdout(predicate::str::contains("zone administrator"));

    tdmx_ca(path)
        .args(["domain", "create", "example.com", "--out-dir"])
        .arg(path)
        .arg("--issuer")
        .arg(path.join("example.com.zone.tdmx-keystore"))
        .assert()
        .success();

    tdmx_ca(path)
        .args(["user", "create", "alice", "--out-dir"])
        .arg(path)
        .arg("--issuer")
        .arg(path.join("example.com.domain.tdmx-keystore"))
        .assert()
        .success();
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    tdmx_ca(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("trust-list"));
}

#[test]
fn issues_and_verifies_a_hierarchy() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();

    assert!(path.join("alice@example.com.tdmx-keystore").exists());

    tdmx_ca(path)
        .arg("verify")
        .arg("--zone")
        .arg(path.join("example.com.zone.crt"))
        .arg("--domain")
        .arg(path.join("example.com.domain.crt"))
        .arg("--user")
        .arg(path.join("alice@example.com.crt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("OK:"));
}

#[test]
fn swapped_certificates_fail_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();

    tdmx_ca(path)
        .args(["--output", "json", "verify", "--zone"])
        .arg(path.join("example.com.zone.crt"))
        .arg("--domain")
        .arg(path.join("alice@example.com.crt"))
        .arg("--user")
        .arg(path.join("example.com.domain.crt"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"valid\": false"));
}

#[test]
fn verify_honours_check_time() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();

    tdmx_ca(path)
        .args(["verify", "--at", "2000-01-01T00:00:00Z", "--zone"])
        .arg(path.join("example.com.zone.crt"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("INVALID:"));
}

#[test]
fn wrong_passphrase_is_reported() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();

    tdmx_ca(path)
        .args(["--passphrase", "not it", "domain", "create", "other.example.com", "--out-dir"])
        .arg(path)
        .arg("--issuer")
        .arg(path.join("example.com.zone.tdmx-keystore"))
        .assert()
        .failure();
    assert!(!path.join("other.example.com.domain.crt").exists());
}

#[test]
fn refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    let create = |force: bool| {
        let mut cmd = tdmx_ca(path);
        cmd.args(["zone", "create", "example.org", "--out-dir"]).arg(path);
        if force {
            cmd.arg("--force");
        }
        cmd.assert()
    };

    create(false).success();
    create(false)
        .failure()
        .stderr(predicate::str::contains("already exists"));
    create(true).success();
}

#[test]
fn inspect_shows_zone_info_as_json() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();

    let output = tdmx_ca(path)
        .args(["--output", "json", "inspect"])
        .arg(path.join("alice@example.com.crt"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let summaries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chain = summaries.as_array().unwrap();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0]["role"], "user");
    assert_eq!(chain[0]["zone_info"]["zone_root"], "example.com");
    assert_eq!(chain[2]["role"], "zone-admin");
    assert_eq!(chain[2]["self_signed"], true);
}

#[test]
fn trust_list_add_then_show() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();
    let list = path.join("trusted.pem");

    tdmx_ca(path)
        .args(["trust-list", "add"])
        .arg(&list)
        .arg(path.join("example.com.zone.crt"))
        .args(["--friendly-name", "Example zone", "--comment", "first zone"])
        .assert()
        .success();

    tdmx_ca(path)
        .args(["trust-list", "show"])
        .arg(&list)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entries"))
        .stdout(predicate::str::contains("Example zone"))
        .stdout(predicate::str::contains("first zone"));
}

#[test]
fn roots_scans_given_paths() {
    let dir = TempDir::new().unwrap();
    issue_hierarchy(&dir);
    let path = dir.path();

    tdmx_ca(path)
        .args(["roots", "--path"])
        .arg(path.join("example.com.zone.crt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 certificates"));
}

#[test]
fn config_set_and_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path();

    tdmx_ca(path)
        .args(["config", "set", "user_validity_days", "30"])
        .assert()
        .success();
    tdmx_ca(path)
        .args(["config", "set", "bogus", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));

    tdmx_ca(path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user_validity_days: 30"));
    tdmx_ca(path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}
