//! Show command.

use serde_json::{Map, Value};

use crate::cli::{display, output, Paths};
use crate::core::schema;
use crate::core::state::StateFile;
use crate::error::Result;

/// Print state with sensitive values replaced.
pub fn execute(paths: &Paths, json: bool) -> Result<()> {
    let state = paths.load_state()?;
    let redacted = redacted(&state);

    if json {
        println!("{}", serde_json::to_string_pretty(&redacted)?);
        return Ok(());
    }

    if redacted.is_empty() {
        output::dimmed(&format!("no resources in {}", display(&paths.state)));
        return Ok(());
    }

    for (address, attributes) in &redacted {
        output::section(address);
        if let Value::Object(attributes) = attributes {
            for (name, value) in attributes {
                output::kv(name, render(value));
            }
        }
    }

    Ok(())
}

/// State of every resource keyed by address, sensitive values redacted.
pub fn redacted(state: &StateFile) -> Map<String, Value> {
    state
        .resources
        .iter()
        .map(|(address, stored)| {
            let mut value = stored.state.clone();
            if let Some(schema) = schema::lookup(&stored.kind) {
                schema::redact(schema, &mut value);
            }
            (address.clone(), value)
        })
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
