//! Import command.

use crate::cli::{connect, output, Paths};
use crate::core::apply::Engine;
use crate::error::Result;

/// Adopt an existing remote object into state.
pub fn execute(paths: &Paths, resource_type: &str, id: &str) -> Result<()> {
    let manifest = paths.manifest_or_default()?;
    let client = connect(&manifest)?;
    let mut state = paths.load_state()?;

    let change = Engine::new(&client, &mut state).import(resource_type, id)?;
    state.save(&paths.state)?;

    output::success(&format!("imported {}", output::path(&change.address)));
    Ok(())
}
