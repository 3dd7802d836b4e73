//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// A `cpln-provider` command running in the workspace.
    ///
    /// Provider environment variables from the host are removed and color
    /// is disabled so output is stable.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd =
            Command::cargo_bin("cpln-provider").expect("failed to find cpln-provider binary");
        for var in [
            "CPLN_ORG",
            "CPLN_ENDPOINT",
            "CPLN_TOKEN",
            "CPLN_TIMEOUT",
            "CPLN_PROVIDER_LOG",
            "CPLN_PROVIDER_LOG_FORMAT",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `cpln-provider validate`.
    pub fn validate(&self) -> Output {
        self.cmd()
            .arg("validate")
            .output()
            .expect("failed to run cpln-provider validate")
    }

    /// Shortcut for `cpln-provider show`.
    pub fn show(&self, json: bool) -> Output {
        let mut cmd = self.cmd();
        cmd.arg("show");
        if json {
            cmd.arg("--json");
        }
        cmd.output().expect("failed to run cpln-provider show")
    }

    /// Shortcut for `cpln-provider apply`.
    pub fn apply(&self) -> Output {
        self.cmd()
            .arg("apply")
            .output()
            .expect("failed to run cpln-provider apply")
    }
}
