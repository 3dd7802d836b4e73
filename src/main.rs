//! cpln-provider - declarative domain routes and secrets for Control Plane.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cpln_provider::cli::output;
use cpln_provider::cli::{execute, Cli};
use cpln_provider::core::constants::{ENV_LOG, ENV_LOG_FORMAT, ENV_TOKEN, MANIFEST_FILE};
use cpln_provider::core::diag::Diagnostic;
use cpln_provider::error::{ConfigError, Error, ResourceError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cpln_provider=debug")
        } else {
            EnvFilter::new("cpln_provider=warn")
        }
    });

    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v == "json");

    tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(|| {
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr)
        }))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .init();

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Config(ConfigError::ManifestNotFound(_)) => {
                Some(format!("create {} or pass -f <path>", MANIFEST_FILE))
            }
            Error::Config(ConfigError::MissingField { env, .. }) => {
                Some(format!("export {}=...", env))
            }
            Error::Resource(ResourceError::AlreadyExists { .. }) => {
                Some("run: cpln-provider import <type> <id>".to_string())
            }
            Error::Api(_) if e.status() == Some(401) || e.status() == Some(403) => {
                Some(format!("check {}", ENV_TOKEN))
            }
            _ => None,
        };

        output::diagnostic(&Diagnostic::from(&e));
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}
