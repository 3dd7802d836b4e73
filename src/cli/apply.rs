//! Apply, refresh and destroy commands.
//!
//! State is saved after the engine runs even when it fails, so resources
//! created before the failure stay tracked.

use crate::cli::{connect, display, output, validate, Paths};
use crate::core::apply::{summarize, Action, Change, Engine};
use crate::core::manifest::Manifest;
use crate::core::state::StateFile;
use crate::error::Result;

/// Reconcile the manifest.
pub fn apply(paths: &Paths) -> Result<()> {
    let manifest = Manifest::load(&paths.manifest)?;
    validate::check(&manifest)?;

    let client = connect(&manifest)?;
    let mut state = paths.load_state()?;

    let result = Engine::new(&client, &mut state).apply(&manifest);
    finish(paths, &state, result, "apply complete")
}

/// Re-read every resource in state.
pub fn refresh(paths: &Paths) -> Result<()> {
    let manifest = paths.manifest_or_default()?;
    let client = connect(&manifest)?;
    let mut state = paths.load_state()?;

    let result = Engine::new(&client, &mut state).refresh();
    finish(paths, &state, result, "refresh complete")
}

/// Delete everything in state.
pub fn destroy(paths: &Paths) -> Result<()> {
    let manifest = paths.manifest_or_default()?;
    let mut state = paths.load_state()?;

    if state.is_empty() {
        output::dimmed("nothing to destroy");
        return Ok(());
    }

    let client = connect(&manifest)?;
    let result = Engine::new(&client, &mut state).destroy();
    finish(paths, &state, result, "destroy complete")
}

fn finish(
    paths: &Paths,
    state: &StateFile,
    result: Result<Vec<Change>>,
    done: &str,
) -> Result<()> {
    state.save(&paths.state)?;
    let changes = result?;

    for change in changes.iter().filter(|c| c.action != Action::NoOp) {
        output::change(change);
    }

    output::success(&format!("{}: {}", done, summarize(&changes)));
    output::dimmed(&format!("state written to {}", display(&paths.state)));
    Ok(())
}
