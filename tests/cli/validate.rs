//! Tests for the validate command.

use crate::support::*;

#[test]
fn test_validate_accepts_manifest() {
    let t = Test::with_manifest(MANIFEST);

    let output = t.validate();
    assert_success(&output);
    assert!(stdout(&output).contains("cpln.toml is valid (2 resources)"));
}

#[test]
fn test_validate_reports_every_problem() {
    let t = Test::with_manifest(INVALID_MANIFEST);

    let output = t.validate();
    assert_failure(&output);
    let err = stderr(&output);
    assert!(err.contains("secret[0].name"), "got: {}", err);
    assert!(err.contains("exactly one of"), "got: {}", err);
    assert!(err.contains("problem(s) found"), "got: {}", err);
}

#[test]
fn test_validate_missing_manifest_hints() {
    let t = Test::new();

    let output = t.validate();
    assert_failure(&output);
    assert_stderr_contains(&output, "manifest not found");
    assert_stderr_contains(&output, "pass -f <path>");
}

#[test]
fn test_validate_custom_manifest_path() {
    let t = Test::new();
    std::fs::write(t.dir.path().join("routes.toml"), MANIFEST).unwrap();

    let output = t
        .cmd()
        .args(["validate", "-f", "routes.toml"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("routes.toml is valid"));
}

#[test]
fn test_validate_rejects_unknown_table() {
    let t = Test::with_manifest("[[workload]]\nname = \"api\"\n");

    let output = t.validate();
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse manifest");
}

#[test]
fn test_validate_flags_duplicate_addresses() {
    let t = Test::with_manifest(
        r#"
[[secret]]
name = "db"
opaque = { payload = "a" }

[[secret]]
name = "db"
opaque = { payload = "b" }
"#,
    );

    let output = t.validate();
    assert_failure(&output);
    assert_stderr_contains(&output, "duplicate resource");
}

#[test]
fn test_validate_flags_unsupported_attribute() {
    let t = Test::with_manifest(
        r#"
[[domain_route]]
domain_link = "/org/acme/domain/example.com"
prefix = "/api"
workload_link = "/org/acme/gvc/main/workload/api"
weight = 10
"#,
    );

    let output = t.validate();
    assert_failure(&output);
    assert_stderr_contains(&output, "domain_route[0].weight: unsupported attribute");
}
