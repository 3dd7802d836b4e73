//! Resource handlers.
//!
//! Each resource type implements [`Resource`]: it maps manifest arguments to
//! API calls and maps API responses back into local state. The apply engine
//! only sees this trait.
//!
//! ## Adding a New Resource
//!
//! 1. Declare its schema in `core::schema`
//! 2. Add a module here with `Args`/`State` types and the CRUD functions
//! 3. Implement `Resource` on a unit struct and wire it into the manifest

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::core::client::ControlPlane;
use crate::core::schema::ResourceSchema;
use crate::core::types::{Address, Tags};
use crate::error::Result;

pub mod domain_route;
pub mod secret;

pub use domain_route::DomainRouteResource;
pub use secret::SecretResource;

/// A resource type the engine can reconcile.
pub trait Resource {
    /// Manifest table and state type name (e.g., `secret`).
    const TYPE_NAME: &'static str;

    /// Desired configuration as written in the manifest.
    type Args: Serialize + DeserializeOwned + Clone + Debug;

    /// Last known state as recorded in the state file.
    type State: Serialize + DeserializeOwned + Clone + PartialEq + Debug;

    /// Attribute declarations.
    fn schema() -> &'static ResourceSchema;

    /// Address of the desired resource. Embeds every force-new attribute, so a
    /// change to one of them yields a different address.
    fn address(args: &Self::Args) -> Address;

    /// Address of an applied resource.
    fn state_address(state: &Self::State) -> Address;

    /// Whether moving from `prior` to `args` needs delete + create even though
    /// the address is unchanged.
    fn requires_replace(_prior: &Self::State, _args: &Self::Args) -> bool {
        false
    }

    fn create(api: &dyn ControlPlane, args: &Self::Args) -> Result<Self::State>;

    /// Re-read the remote object. `Ok(None)` means it no longer exists.
    fn read(api: &dyn ControlPlane, state: &Self::State) -> Result<Option<Self::State>>;

    /// Submit what changed between `prior` and `args`. Returns `prior`
    /// unchanged, without calling the API, when nothing changed.
    fn update(api: &dyn ControlPlane, prior: &Self::State, args: &Self::Args)
        -> Result<Self::State>;

    fn delete(api: &dyn ControlPlane, state: &Self::State) -> Result<()>;

    /// Minimal state for an import id, to be completed by [`Resource::read`].
    fn import(id: &str) -> Result<Self::State>;
}

/// Description sent to the API: an empty description defaults to the name.
pub fn description_helper(name: &str, description: &str) -> String {
    if description.is_empty() {
        name.to_string()
    } else {
        description.to_string()
    }
}

/// Whether the description needs to be submitted.
///
/// An empty configured description is equivalent to a stored description
/// equal to the name, since that is what the API stores for it.
pub fn description_changed(prior: Option<&str>, desired: Option<&str>, name: &str) -> bool {
    let prior = prior.unwrap_or_default();
    let desired = desired.unwrap_or_default();

    if desired.is_empty() && prior == name {
        return false;
    }

    prior != desired
}

/// Tag patch moving `prior` to `desired`: removed keys are set to `null`.
pub fn tag_changes(prior: &Tags, desired: &Tags) -> BTreeMap<String, Value> {
    let mut changes: BTreeMap<String, Value> = prior
        .keys()
        .filter(|k| !desired.contains_key(*k))
        .map(|k| (k.clone(), Value::Null))
        .collect();

    for (k, v) in desired {
        changes.insert(k.clone(), Value::String(v.clone()));
    }

    changes
}

/// Tags as the API expects them on create.
pub fn tags_value(tags: &Tags) -> BTreeMap<String, Value> {
    tags.iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

/// Whether two JSON documents held as strings are equivalent.
///
/// Both sides must parse for a structural comparison; otherwise the raw
/// strings are compared.
pub fn json_equivalent(a: &str, b: &str) -> bool {
    if !a.is_empty() && !b.is_empty() {
        if let (Ok(x), Ok(y)) = (
            serde_json::from_str::<Value>(a),
            serde_json::from_str::<Value>(b),
        ) {
            return x == y;
        }
    }
    a == b
}

/// `Some(value)` unless the value is empty.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
