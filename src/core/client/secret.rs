//! Secret objects as exchanged with the API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::base::Base;

/// Remote secret type.
///
/// Serialized in the API's kebab-case form (`azure-sdk`); [`SecretType::local_name`]
/// gives the snake_case attribute name used in manifests and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretType {
    Aws,
    AzureConnector,
    AzureSdk,
    Docker,
    Dictionary,
    Ecr,
    Gcp,
    Keypair,
    NatsAccount,
    Opaque,
    Tls,
    Userpass,
}

impl SecretType {
    /// Every type, in attribute order.
    pub const ALL: [SecretType; 12] = [
        SecretType::Aws,
        SecretType::AzureConnector,
        SecretType::AzureSdk,
        SecretType::Docker,
        SecretType::Dictionary,
        SecretType::Ecr,
        SecretType::Gcp,
        SecretType::Keypair,
        SecretType::NatsAccount,
        SecretType::Opaque,
        SecretType::Tls,
        SecretType::Userpass,
    ];

    /// Attribute name of this type's data field.
    pub fn local_name(self) -> &'static str {
        match self {
            SecretType::Aws => "aws",
            SecretType::AzureConnector => "azure_connector",
            SecretType::AzureSdk => "azure_sdk",
            SecretType::Docker => "docker",
            SecretType::Dictionary => "dictionary",
            SecretType::Ecr => "ecr",
            SecretType::Gcp => "gcp",
            SecretType::Keypair => "keypair",
            SecretType::NatsAccount => "nats_account",
            SecretType::Opaque => "opaque",
            SecretType::Tls => "tls",
            SecretType::Userpass => "userpass",
        }
    }

    /// Name used by the API.
    pub fn remote_name(self) -> &'static str {
        match self {
            SecretType::AzureConnector => "azure-connector",
            SecretType::AzureSdk => "azure-sdk",
            SecretType::NatsAccount => "nats-account",
            other => other.local_name(),
        }
    }

    /// Types whose data is a raw JSON document held as a string.
    pub fn is_json_document(self) -> bool {
        matches!(
            self,
            SecretType::Gcp | SecretType::Docker | SecretType::AzureSdk
        )
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

/// A secret envelope.
///
/// On create the payload goes in `data`; on update it goes in
/// `$replace/data` so the server replaces the whole document instead of
/// merging it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(flatten)]
    pub base: Base,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<SecretType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(
        rename = "$replace/data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub data_replace: Option<Value>,
}

impl Secret {
    /// Name of the secret, empty when unset.
    pub fn name(&self) -> &str {
        self.base.name.as_deref().unwrap_or_default()
    }
}
