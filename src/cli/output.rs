//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success, created resources
//! - Red: errors, deleted resources
//! - Yellow: warnings, updated resources
//! - Cyan: paths, addresses, hints
//! - Bold: headers
//! - Dimmed: secondary info

use console::style;
use std::fmt::Display;

use crate::core::apply::{Action, Change};
use crate::core::diag::{Diagnostic, Severity};

const RULE_WIDTH: usize = 56;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a success message with checkmark (green).
///
/// Example: `✓ manifest is valid`
pub fn success(msg: &str) {
    if colors_enabled() {
        println!("{} {}", style("✓").green(), msg);
    } else {
        println!("✓ {}", msg);
    }
}

/// Print an error message to stderr (red).
pub fn error(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("✗").red(), msg);
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Print a warning message to stderr (yellow).
pub fn warn(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("⚠").yellow(), msg);
    } else {
        eprintln!("⚠ {}", msg);
    }
}

/// Print a hint message to stderr (cyan).
///
/// Example: `→ set CPLN_TOKEN or [provider].token`
pub fn hint(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
    } else {
        eprintln!("→ {}", msg);
    }
}

/// Print a bold header.
pub fn header(title: &str) {
    if colors_enabled() {
        println!("{}", style(title).bold());
    } else {
        println!("{}", title);
    }
}

/// Print a key-value pair (label dimmed).
///
/// Example: `  domain_link  /org/acme/domain/example.com`
pub fn kv(label: &str, value: impl Display) {
    if colors_enabled() {
        println!("  {}  {}", style(label).dim(), value);
    } else {
        println!("  {}  {}", label, value);
    }
}

/// Print a horizontal rule separator.
pub fn rule() {
    if colors_enabled() {
        println!("{}", style("─".repeat(RULE_WIDTH)).dim());
    } else {
        println!("{}", "─".repeat(RULE_WIDTH));
    }
}

/// Print a section header with a separator line.
pub fn section(title: &str) {
    println!();
    header(title);
    rule();
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    if colors_enabled() {
        println!("{}", style(msg).dim());
    } else {
        println!("{}", msg);
    }
}

/// Format a path or address in cyan.
pub fn path(p: &str) -> String {
    if colors_enabled() {
        style(p).cyan().to_string()
    } else {
        p.to_string()
    }
}

/// Print one line of an apply/refresh/destroy report.
pub fn change(change: &Change) {
    if !colors_enabled() {
        println!("{}", change);
        return;
    }

    let symbol = format!("{:>3}", change.action.symbol());
    let symbol = match change.action {
        Action::Create | Action::Import => style(symbol).green(),
        Action::Update => style(symbol).yellow(),
        Action::Replace | Action::Delete | Action::Forget => style(symbol).red(),
        Action::NoOp => style(symbol).dim(),
    };
    println!("{} {}", symbol, change.address);
}

/// Print a diagnostic to stderr.
pub fn diagnostic(diag: &Diagnostic) {
    match diag.severity {
        Severity::Error => error(&diag.to_string()),
        Severity::Warning => warn(&diag.to_string()),
    }
}
