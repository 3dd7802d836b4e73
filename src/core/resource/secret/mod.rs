//! Secret resource.
//!
//! A secret is a named envelope holding exactly one typed payload (see
//! [`data`]). The handlers translate between the manifest/state attribute
//! layout and the API's single polymorphic `data` document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::core::client::{Base, ControlPlane, Secret};
use crate::core::constants::SECRET_REFERENCE_PREFIX;
use crate::core::resource::{
    description_changed, description_helper, tag_changes, tags_value, Resource,
};
use crate::core::schema::{self, ResourceSchema};
use crate::core::types::{Address, ResourceId, Tags};
use crate::core::validation;
use crate::error::{ResourceError, Result};

pub mod data;

pub use data::{build_data, parse_data, SecretData, SecretFields};

/// Desired secret as written in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretArgs {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
    #[serde(flatten)]
    pub fields: SecretFields,
}

/// Applied secret as recorded in state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretState {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpln_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Env-var references to each dictionary key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dictionary_as_envs: BTreeMap<String, String>,
    #[serde(flatten)]
    pub fields: SecretFields,
}

impl SecretState {
    /// The stored payload, if the server returned one.
    pub fn data(&self) -> Option<SecretData> {
        self.fields.data().ok()
    }
}

/// Map a secret returned by the API into local state.
///
/// # Errors
///
/// `ResourceError::UnknownSecretType` when the server omitted the type, or a
/// parse error when the data does not match it.
pub fn set_secret(secret: &Secret) -> Result<SecretState> {
    let name = secret.name().to_string();
    let secret_type = secret
        .secret_type
        .ok_or(ResourceError::UnknownSecretType)?;

    let mut state = SecretState {
        id: name.clone(),
        cpln_id: secret.base.id.clone(),
        name,
        description: secret.base.description.clone(),
        tags: secret.base.string_tags(),
        self_link: secret.base.self_link().map(str::to_string),
        dictionary_as_envs: BTreeMap::new(),
        fields: SecretFields::default(),
    };

    if let Some(value) = &secret.data {
        let data = parse_data(secret_type, value)?;

        if let SecretData::Dictionary(entries) = &data {
            state.dictionary_as_envs = entries
                .keys()
                .map(|key| {
                    (
                        key.clone(),
                        format!("{}{}.{}", SECRET_REFERENCE_PREFIX, state.name, key),
                    )
                })
                .collect();
        }

        state.fields = SecretFields::from_data(data);
    }

    Ok(state)
}

/// Create a secret.
///
/// # Errors
///
/// `ResourceError::AlreadyExists` when the API answers 409; other client
/// errors pass through.
pub fn create(api: &dyn ControlPlane, args: &SecretArgs) -> Result<SecretState> {
    let data = args.fields.data()?;
    let secret_type = data.secret_type();
    let description = args.description.as_deref().unwrap_or_default();

    let secret = Secret {
        base: Base {
            name: Some(args.name.clone()),
            description: Some(description_helper(&args.name, description)),
            tags: (!args.tags.is_empty()).then(|| tags_value(&args.tags)),
            ..Default::default()
        },
        secret_type: Some(secret_type),
        data: Some(build_data(&data, false)),
        data_replace: None,
    };

    info!(name = %args.name, r#type = %secret_type, "creating secret");

    match api.create_secret(&secret) {
        Ok(created) => set_secret(&created),
        Err(e) if e.is_conflict() => Err(ResourceError::AlreadyExists {
            kind: "secret",
            name: args.name.clone(),
        }
        .into()),
        Err(e) => Err(e),
    }
}

/// Re-read a secret. `Ok(None)` when it no longer exists.
pub fn read(api: &dyn ControlPlane, state: &SecretState) -> Result<Option<SecretState>> {
    match api.get_secret(&state.id) {
        Ok(secret) => set_secret(&secret).map(Some),
        Err(e) if e.is_not_found() => {
            debug!(id = %state.id, "secret is gone");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Submit the changed parts of a secret.
///
/// Description and tags are sent only when they changed. The data document
/// is sent as `$replace/data` only when the payload changed, with cleared
/// optionals set to `null`.
pub fn update(api: &dyn ControlPlane, prior: &SecretState, args: &SecretArgs) -> Result<SecretState> {
    let data = args.fields.data()?;

    let description_dirty = description_changed(
        prior.description.as_deref(),
        args.description.as_deref(),
        &args.name,
    );
    let tags_dirty = prior.tags != args.tags;
    let data_dirty = match prior.data() {
        Some(existing) => !existing.equivalent(&data),
        None => true,
    };

    if !(description_dirty || tags_dirty || data_dirty) {
        debug!(name = %args.name, "secret unchanged");
        return Ok(prior.clone());
    }

    let mut secret = Secret {
        base: Base {
            name: Some(args.name.clone()),
            ..Default::default()
        },
        ..Default::default()
    };

    if description_dirty {
        let description = args.description.as_deref().unwrap_or_default();
        secret.base.description = Some(description_helper(&args.name, description));
    }

    if tags_dirty {
        secret.base.tags = Some(tag_changes(&prior.tags, &args.tags));
    }

    if data_dirty {
        secret.secret_type = Some(data.secret_type());
        secret.data_replace = Some(build_data(&data, true));
    }

    info!(
        name = %args.name,
        description = description_dirty,
        tags = tags_dirty,
        data = data_dirty,
        "updating secret"
    );

    let updated = api.update_secret(&secret)?;
    set_secret(&updated)
}

/// Delete a secret.
pub fn delete(api: &dyn ControlPlane, state: &SecretState) -> Result<()> {
    info!(id = %state.id, "deleting secret");
    api.delete_secret(&state.id)
}

/// Import by name.
pub fn import(id: &str) -> Result<SecretState> {
    validation::validate_name("name", id).map_err(|e| ResourceError::InvalidImportId {
        id: id.to_string(),
        reason: e.to_string(),
    })?;

    Ok(SecretState {
        id: id.to_string(),
        name: id.to_string(),
        ..Default::default()
    })
}

/// The `secret` resource type.
pub struct SecretResource;

impl Resource for SecretResource {
    const TYPE_NAME: &'static str = "secret";

    type Args = SecretArgs;
    type State = SecretState;

    fn schema() -> &'static ResourceSchema {
        &schema::SECRET
    }

    fn address(args: &SecretArgs) -> Address {
        format!("{}.{}", Self::TYPE_NAME, args.name)
    }

    fn state_address(state: &SecretState) -> Address {
        format!("{}.{}", Self::TYPE_NAME, state.name)
    }

    /// The API does not allow changing a secret's type in place.
    fn requires_replace(prior: &SecretState, args: &SecretArgs) -> bool {
        match (prior.data(), args.fields.data()) {
            (Some(old), Ok(new)) => old.secret_type() != new.secret_type(),
            _ => false,
        }
    }

    fn create(api: &dyn ControlPlane, args: &SecretArgs) -> Result<SecretState> {
        create(api, args)
    }

    fn read(api: &dyn ControlPlane, state: &SecretState) -> Result<Option<SecretState>> {
        read(api, state)
    }

    fn update(api: &dyn ControlPlane, prior: &SecretState, args: &SecretArgs) -> Result<SecretState> {
        update(api, prior, args)
    }

    fn delete(api: &dyn ControlPlane, state: &SecretState) -> Result<()> {
        delete(api, state)
    }

    fn import(id: &str) -> Result<SecretState> {
        import(id)
    }
}
