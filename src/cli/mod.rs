//! Command-line interface.

pub mod apply;
pub mod import;
pub mod output;
pub mod show;
pub mod validate;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};

use crate::core::client::Client;
use crate::core::config::ProviderConfig;
use crate::core::constants;
use crate::core::manifest::Manifest;
use crate::core::state::{self, StateFile};
use crate::error::Result;

/// Manage Control Plane domain routes and secrets declaratively.
#[derive(Parser)]
#[command(
    name = "cpln-provider",
    about = "Manage Control Plane domain routes and secrets declaratively",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Manifest file
    #[arg(short = 'f', long = "file", global = true, default_value = constants::MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// State file (defaults to .cpln-state.json next to the manifest)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Check the manifest against the resource schemas
    Validate,

    /// Create, update and delete resources to match the manifest
    Apply,

    /// Re-read every resource in state from the API
    Refresh,

    /// Delete every resource in state
    Destroy,

    /// Adopt an existing remote object into state
    Import {
        /// Resource type (secret or domain_route)
        #[arg(value_name = "TYPE")]
        resource_type: String,
        /// Secret name, or {domain_link}_{domain_port}_{prefix} for a route
        id: String,
    },

    /// Print state with sensitive values redacted
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Manifest and state locations for one invocation.
#[derive(Debug, Clone)]
pub struct Paths {
    pub manifest: PathBuf,
    pub state: PathBuf,
}

impl Paths {
    pub fn new(manifest: PathBuf, state: Option<PathBuf>) -> Self {
        let state = state.unwrap_or_else(|| state::default_path(&manifest));
        Self { manifest, state }
    }

    /// The manifest, or an empty one when the file does not exist.
    ///
    /// Commands that only act on state can run from environment
    /// configuration alone.
    pub fn manifest_or_default(&self) -> Result<Manifest> {
        if self.manifest.exists() {
            Manifest::load(&self.manifest)
        } else {
            Ok(Manifest::default())
        }
    }

    pub fn load_state(&self) -> Result<StateFile> {
        StateFile::load(&self.state)
    }
}

/// Build an API client from the manifest's provider settings.
pub fn connect(manifest: &Manifest) -> Result<Client> {
    let config = ProviderConfig::resolve(&manifest.provider)?;
    Client::new(config)
}

/// Write a completion script for `shell` to stdout.
pub fn completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "cpln-provider", &mut std::io::stdout());
    Ok(())
}

/// Display form of a path.
pub fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let paths = Paths::new(cli.manifest, cli.state);

    match cli.command {
        Validate => validate::execute(&paths),
        Apply => apply::apply(&paths),
        Refresh => apply::refresh(&paths),
        Destroy => apply::destroy(&paths),
        Import { resource_type, id } => import::execute(&paths, &resource_type, &id),
        Show { json } => show::execute(&paths, json),
        Completions { shell } => completions(shell),
    }
}
