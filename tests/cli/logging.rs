//! Tests for log output.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_quiet_by_default() {
    let t = Test::with_manifest(MANIFEST);

    t.cmd()
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG").not());
}

#[test]
fn test_verbose_enables_debug_logs() {
    let t = Test::with_manifest(MANIFEST);

    t.cmd()
        .args(["--verbose", "validate"])
        .assert()
        .success()
        .stderr(predicate::str::contains("loading manifest"));
}

#[test]
fn test_log_filter_from_environment() {
    let t = Test::with_manifest(MANIFEST);

    t.cmd()
        .arg("validate")
        .env("CPLN_PROVIDER_LOG", "cpln_provider=debug")
        .assert()
        .success()
        .stderr(predicate::str::contains("manifest loaded"));
}

#[test]
fn test_json_log_format() {
    let t = Test::with_manifest(MANIFEST);

    t.cmd()
        .args(["--verbose", "validate"])
        .env("CPLN_PROVIDER_LOG_FORMAT", "json")
        .assert()
        .success()
        .stderr(
            predicate::str::contains(r#""level":"DEBUG""#)
                .and(predicate::str::contains("loading manifest")),
        );
}
