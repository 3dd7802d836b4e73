//! Tests for apply, refresh and destroy.
//!
//! These stop before any request is sent; reconciliation itself is covered
//! by the engine tests.

use crate::support::*;
use serde_json::json;

#[test]
fn test_apply_without_token_hints() {
    let t = Test::with_manifest(MANIFEST);

    let output = t.apply();
    assert_failure(&output);
    assert_stderr_contains(&output, "missing provider setting: token");
    assert_stderr_contains(&output, "export CPLN_TOKEN=...");
    assert!(!t.state_path().exists());
}

#[test]
fn test_apply_without_org_hints() {
    let t = Test::with_manifest("[[secret]]\nname = \"db\"\nopaque = { payload = \"x\" }\n");

    let output = t.cmd().arg("apply").env("CPLN_TOKEN", "token").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "export CPLN_ORG=...");
}

#[test]
fn test_apply_validates_before_connecting() {
    let t = Test::with_manifest(INVALID_MANIFEST);

    let output = t.apply();
    assert_failure(&output);
    assert_stderr_contains(&output, "problem(s) found");
    assert!(!stderr(&output).contains("CPLN_TOKEN"));
}

#[test]
fn test_destroy_with_empty_state() {
    let t = Test::new();

    let output = t.cmd().arg("destroy").output().unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("nothing to destroy"));
}

#[test]
fn test_refresh_requires_credentials() {
    let t = Test::new();
    t.write_state(&json!({"version": 1, "resources": {}}));

    let output = t.cmd().arg("refresh").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "CPLN_");
}

#[test]
fn test_refresh_empty_state_from_environment() {
    let t = Test::new();

    let output = t
        .cmd()
        .arg("refresh")
        .env("CPLN_ORG", "acme")
        .env("CPLN_TOKEN", "token")
        .env("CPLN_ENDPOINT", "http://127.0.0.1:9")
        .output()
        .unwrap();

    assert_success(&output);
    assert!(stdout(&output).contains("refresh complete: 0 created, 0 updated, 0 replaced, 0 deleted"));
    assert_eq!(t.read_state(), json!({"version": 1, "resources": {}}));
}

#[cfg(unix)]
#[test]
fn test_state_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::new();
    let output = t
        .cmd()
        .arg("refresh")
        .env("CPLN_ORG", "acme")
        .env("CPLN_TOKEN", "token")
        .output()
        .unwrap();
    assert_success(&output);

    let mode = std::fs::metadata(t.state_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
