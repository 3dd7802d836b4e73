//! Core library components.
//!
//! The resource handlers and the API client they call, plus the small host
//! that drives them: schemas, manifest, state file and the reconcile engine.

pub mod apply;
pub mod client;
pub mod config;
pub mod constants;
pub mod diag;
pub mod manifest;
pub mod resource;
pub mod schema;
pub mod state;
pub mod types;
pub mod validation;
