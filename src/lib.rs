//! cpln-provider - domain route and secret resources for the Control Plane API.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── validate      # Schema-check the manifest
//! │   ├── apply         # apply, refresh, destroy
//! │   ├── import        # Adopt existing remote objects
//! │   ├── show          # Print state, redacted
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── client/       # ControlPlane trait + HTTP client
//!     ├── resource/     # Resource handlers
//!     │   ├── domain_route
//!     │   └── secret/   # Secret handler + data rename table
//!     ├── schema        # Attribute declarations and validation
//!     ├── config        # [provider] settings + CPLN_* env
//!     ├── manifest      # cpln.toml
//!     ├── state         # .cpln-state.json
//!     ├── apply         # Reconcile engine
//!     └── diag          # Diagnostics
//! ```
//!
//! # Resources
//!
//! - `domain_route`: a path prefix on a domain port routed to a workload
//! - `secret`: one of twelve typed payloads (aws, tls, opaque, ...)

pub mod cli;
pub mod core;
pub mod error;
