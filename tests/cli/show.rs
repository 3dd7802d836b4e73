//! Tests for the show command.

use crate::support::*;
use serde_json::{json, Value};

fn state_with_secret() -> Value {
    json!({
        "version": 1,
        "resources": {
            "secret.db": {
                "type": "secret",
                "state": {
                    "id": "db",
                    "name": "db",
                    "description": "db",
                    "userpass": {"username": "admin", "password": "hunter2", "encoding": "plain"}
                }
            },
            "domain_route./org/acme/domain/example.com_443_/api": {
                "type": "domain_route",
                "state": {
                    "id": "/org/acme/domain/example.com_443_/api",
                    "domain_link": "/org/acme/domain/example.com",
                    "domain_port": 443,
                    "prefix": "/api",
                    "workload_link": "/org/acme/gvc/main/workload/api"
                }
            }
        }
    })
}

#[test]
fn test_show_without_state() {
    let t = Test::new();

    let output = t.show(false);
    assert_success(&output);
    assert!(stdout(&output).contains("no resources in"));
}

#[test]
fn test_show_redacts_sensitive_values() {
    let t = Test::new();
    t.write_state(&state_with_secret());

    let output = t.show(false);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("secret.db"));
    assert!(out.contains("admin"));
    assert!(out.contains("(sensitive)"));
    assert!(!out.contains("hunter2"));
    assert!(out.contains("/org/acme/gvc/main/workload/api"));
}

#[test]
fn test_show_json() {
    let t = Test::new();
    t.write_state(&state_with_secret());

    let output = t.show(true);
    assert_success(&output);
    let shown: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(shown["secret.db"]["userpass"]["password"], "(sensitive)");
    assert_eq!(
        shown["domain_route./org/acme/domain/example.com_443_/api"]["prefix"],
        "/api"
    );
}

#[test]
fn test_show_custom_state_path() {
    let t = Test::new();
    let path = t.dir.path().join("other.json");
    std::fs::write(&path, state_with_secret().to_string()).unwrap();

    let output = t
        .cmd()
        .args(["show", "--json", "--state", "other.json"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("secret.db"));
}

#[test]
fn test_show_corrupt_state_fails() {
    let t = Test::new();
    std::fs::write(t.state_path(), "{ not json").unwrap();

    let output = t.show(false);
    assert_failure(&output);
    assert_stderr_contains(&output, "corrupt state");
}

#[test]
fn test_show_newer_state_version_fails() {
    let t = Test::new();
    t.write_state(&json!({"version": 99, "resources": {}}));

    let output = t.show(false);
    assert_failure(&output);
    assert_stderr_contains(&output, "unsupported state version 99");
}
