//! Test assertion helpers.

use cpln_provider::core::apply::{Action, Change};
use cpln_provider::error::Error;
use std::process::Output;

/// Assert that a command output was successful.
pub fn assert_success(output: &Output) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("Command failed:\n{}", stderr);
    }
}

/// Assert that a command output failed.
pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "Expected command to fail but it succeeded"
    );
}

/// Get stdout as String.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get stderr as String.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert stderr contains a string.
pub fn assert_stderr_contains(output: &Output, expected: &str) {
    let err = stderr(output);
    assert!(
        err.contains(expected),
        "stderr missing '{}', got: {}",
        expected,
        err
    );
}

/// Assert an error carries the given HTTP status.
pub fn assert_status(err: &Error, status: u16) {
    assert_eq!(err.status(), Some(status), "unexpected error: {}", err);
}

/// The action recorded for `address`.
pub fn action_for(changes: &[Change], address: &str) -> Option<Action> {
    changes
        .iter()
        .find(|c| c.address == address)
        .map(|c| c.action)
}
