//! Test support utilities for cpln-provider integration tests.
//!
//! Provides an isolated workspace for CLI tests and an in-memory control
//! plane for handler and engine tests.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fake;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fake::FakeControlPlane;
#[allow(unused_imports)]
pub use fixtures::*;

use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test workspace with an isolated temp directory.
///
/// Child processes use `.current_dir()` so tests can run in parallel.
pub struct Test {
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Workspace with `cpln.toml` written.
    pub fn with_manifest(contents: &str) -> Self {
        let t = Self::new();
        t.write_manifest(contents);
        t
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("cpln.toml")
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join(".cpln-state.json")
    }

    pub fn write_manifest(&self, contents: &str) {
        std::fs::write(self.manifest_path(), contents).expect("failed to write manifest");
    }

    pub fn write_state(&self, state: &Value) {
        let contents = serde_json::to_string_pretty(state).expect("failed to encode state");
        std::fs::write(self.state_path(), contents).expect("failed to write state");
    }

    pub fn read_state(&self) -> Value {
        let contents = std::fs::read_to_string(self.state_path()).expect("failed to read state");
        serde_json::from_str(&contents).expect("state is not JSON")
    }
}
