//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

use std::collections::BTreeMap;

/// Local identity of an applied resource.
pub type ResourceId = String;

/// Manifest/state address of a resource (e.g., `secret.db-password`).
pub type Address = String;

/// User-facing tags on a control plane object.
pub type Tags = BTreeMap<String, String>;
