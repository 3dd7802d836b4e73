//! Tests for error handling and CLI flags.

use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    for command in ["validate", "apply", "refresh", "destroy", "import", "show"] {
        assert!(out.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("plan").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("cpln-provider"));
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("cpln-provider") && out.contains("complete"));
}

#[test]
fn test_completions_rejects_unknown_shell() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "tcsh"]).output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_import_unknown_type_fails_before_any_request() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["import", "workload", "api"])
        .env("CPLN_ORG", "acme")
        .env("CPLN_TOKEN", "token")
        .env("CPLN_ENDPOINT", "http://127.0.0.1:9")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "unknown resource type: workload");
    assert!(!t.state_path().exists());
}

#[test]
fn test_import_rejects_malformed_route_id() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["import", "domain_route", "no-port-here"])
        .env("CPLN_ORG", "acme")
        .env("CPLN_TOKEN", "token")
        .env("CPLN_ENDPOINT", "http://127.0.0.1:9")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "invalid import id");
}

#[test]
fn test_invalid_timeout_is_reported() {
    let t = Test::with_manifest(MANIFEST);

    let output = t
        .cmd()
        .arg("apply")
        .env("CPLN_TOKEN", "token")
        .env("CPLN_TIMEOUT", "soon")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "timeout_secs");
}
