//! Validate command.

use crate::cli::{display, output, Paths};
use crate::core::diag::Diagnostics;
use crate::core::manifest::Manifest;
use crate::error::{Error, Result, ValidationError};

/// Schema-check the manifest without contacting the API.
pub fn execute(paths: &Paths) -> Result<()> {
    let manifest = Manifest::load(&paths.manifest)?;
    check(&manifest)?;

    output::success(&format!(
        "{} is valid ({} resource{})",
        output::path(&display(&paths.manifest)),
        manifest.len(),
        if manifest.len() == 1 { "" } else { "s" }
    ));
    Ok(())
}

/// Print every diagnostic and fail if any is an error.
pub fn check(manifest: &Manifest) -> Result<()> {
    let diags = manifest.validate();
    report(&diags)
}

fn report(diags: &Diagnostics) -> Result<()> {
    for diag in diags.iter() {
        output::diagnostic(diag);
    }

    if diags.has_errors() {
        return Err(Error::Validation(ValidationError::Invalid {
            attribute: "manifest".to_string(),
            reason: format!("{} problem(s) found", diags.len()),
        }));
    }

    Ok(())
}
