//! Secret data shapes and their mapping to the API.
//!
//! Locally each secret type has its own attribute (`aws`, `tls`, ...) with
//! snake_case keys. Remotely there is a single `data` document whose keys are
//! camelCase. [`build_data`] and [`parse_data`] are the two directions of
//! that mapping.
//!
//! | local attribute | remote keys |
//! |---|---|
//! | `aws`, `ecr` | `secretKey`, `accessKey`, `roleArn`, (`externalId`, `repos`) |
//! | `keypair` | `secretKey`, `publicKey`, `passphrase` |
//! | `tls` | `key`, `cert`, `chain` |
//! | `nats_account` | `accountId`, `privateKey` |
//! | `opaque`, `userpass`, `azure_connector`, `dictionary` | unchanged |
//! | `gcp`, `docker`, `azure_sdk` | the JSON document itself, as a string |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::client::SecretType;
use crate::core::constants::DEFAULT_ENCODING;
use crate::core::resource::{json_equivalent, non_empty};
use crate::error::{Result, ResourceError, ValidationError};

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

/// `aws` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsData {
    pub secret_key: String,
    pub access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

/// `ecr` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcrData {
    pub secret_key: String,
    pub access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub repos: BTreeSet<String>,
}

/// `keypair` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypairData {
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

/// `tls` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsData {
    pub key: String,
    #[serde(default)]
    pub cert: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
}

/// `nats_account` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatsAccountData {
    pub account_id: String,
    pub private_key: String,
}

/// `opaque` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueData {
    pub payload: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// `userpass` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserpassData {
    pub username: String,
    pub password: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// `azure_connector` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureConnectorData {
    pub url: String,
    pub code: String,
}

/// The payload of a secret, one variant per type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretData {
    Aws(AwsData),
    AzureConnector(AzureConnectorData),
    AzureSdk(String),
    Docker(String),
    Dictionary(BTreeMap<String, String>),
    Ecr(EcrData),
    Gcp(String),
    Keypair(KeypairData),
    NatsAccount(NatsAccountData),
    Opaque(OpaqueData),
    Tls(TlsData),
    Userpass(UserpassData),
}

impl SecretData {
    pub fn secret_type(&self) -> SecretType {
        match self {
            SecretData::Aws(_) => SecretType::Aws,
            SecretData::AzureConnector(_) => SecretType::AzureConnector,
            SecretData::AzureSdk(_) => SecretType::AzureSdk,
            SecretData::Docker(_) => SecretType::Docker,
            SecretData::Dictionary(_) => SecretType::Dictionary,
            SecretData::Ecr(_) => SecretType::Ecr,
            SecretData::Gcp(_) => SecretType::Gcp,
            SecretData::Keypair(_) => SecretType::Keypair,
            SecretData::NatsAccount(_) => SecretType::NatsAccount,
            SecretData::Opaque(_) => SecretType::Opaque,
            SecretData::Tls(_) => SecretType::Tls,
            SecretData::Userpass(_) => SecretType::Userpass,
        }
    }

    /// Equality up to formatting of JSON documents and unset optionals.
    pub fn equivalent(&self, other: &SecretData) -> bool {
        match (self, other) {
            (SecretData::Gcp(a), SecretData::Gcp(b))
            | (SecretData::Docker(a), SecretData::Docker(b))
            | (SecretData::AzureSdk(a), SecretData::AzureSdk(b)) => json_equivalent(a, b),
            _ => self.normalized() == other.normalized(),
        }
    }

    /// Copy with empty optionals cleared and empty dictionary values dropped,
    /// matching what survives a trip through the API.
    pub fn normalized(&self) -> SecretData {
        let opt = |v: &Option<String>| non_empty(v.as_deref());
        match self {
            SecretData::Aws(a) => SecretData::Aws(AwsData {
                role_arn: opt(&a.role_arn),
                ..a.clone()
            }),
            SecretData::Ecr(e) => SecretData::Ecr(EcrData {
                role_arn: opt(&e.role_arn),
                external_id: opt(&e.external_id),
                ..e.clone()
            }),
            SecretData::Keypair(k) => SecretData::Keypair(KeypairData {
                public_key: opt(&k.public_key),
                passphrase: opt(&k.passphrase),
                ..k.clone()
            }),
            SecretData::Tls(t) => SecretData::Tls(TlsData {
                chain: opt(&t.chain),
                ..t.clone()
            }),
            SecretData::Dictionary(d) => SecretData::Dictionary(
                d.iter()
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// The twelve mutually exclusive data attributes of a secret.
///
/// Shared by manifest arguments and state so both use the attribute names
/// declared in the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_connector: Option<AzureConnectorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_sdk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecr: Option<EcrData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair: Option<KeypairData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nats_account: Option<NatsAccountData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque: Option<OpaqueData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userpass: Option<UserpassData>,
}

impl SecretFields {
    /// Every data attribute that is set, in attribute order.
    pub fn set_types(&self) -> Vec<SecretType> {
        let flags = [
            (SecretType::Aws, self.aws.is_some()),
            (SecretType::AzureConnector, self.azure_connector.is_some()),
            (SecretType::AzureSdk, self.azure_sdk.is_some()),
            (SecretType::Docker, self.docker.is_some()),
            (SecretType::Dictionary, self.dictionary.is_some()),
            (SecretType::Ecr, self.ecr.is_some()),
            (SecretType::Gcp, self.gcp.is_some()),
            (SecretType::Keypair, self.keypair.is_some()),
            (SecretType::NatsAccount, self.nats_account.is_some()),
            (SecretType::Opaque, self.opaque.is_some()),
            (SecretType::Tls, self.tls.is_some()),
            (SecretType::Userpass, self.userpass.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(t, set)| set.then_some(t))
            .collect()
    }

    /// The single data payload.
    ///
    /// # Errors
    ///
    /// `ValidationError::ExactlyOneOf` when zero or several attributes are set.
    pub fn data(&self) -> Result<SecretData> {
        let set = self.set_types();
        if set.len() != 1 {
            return Err(ValidationError::ExactlyOneOf {
                options: SecretType::ALL.iter().map(|t| t.local_name()).collect(),
                found: set.len(),
            }
            .into());
        }

        let data = match set[0] {
            SecretType::Aws => self.aws.clone().map(SecretData::Aws),
            SecretType::AzureConnector => self
                .azure_connector
                .clone()
                .map(SecretData::AzureConnector),
            SecretType::AzureSdk => self.azure_sdk.clone().map(SecretData::AzureSdk),
            SecretType::Docker => self.docker.clone().map(SecretData::Docker),
            SecretType::Dictionary => self.dictionary.clone().map(SecretData::Dictionary),
            SecretType::Ecr => self.ecr.clone().map(SecretData::Ecr),
            SecretType::Gcp => self.gcp.clone().map(SecretData::Gcp),
            SecretType::Keypair => self.keypair.clone().map(SecretData::Keypair),
            SecretType::NatsAccount => self.nats_account.clone().map(SecretData::NatsAccount),
            SecretType::Opaque => self.opaque.clone().map(SecretData::Opaque),
            SecretType::Tls => self.tls.clone().map(SecretData::Tls),
            SecretType::Userpass => self.userpass.clone().map(SecretData::Userpass),
        };

        data.ok_or_else(|| ResourceError::UnknownSecretType.into())
    }

    /// Fields with exactly `data` set.
    pub fn from_data(data: SecretData) -> Self {
        let mut fields = Self::default();
        match data {
            SecretData::Aws(v) => fields.aws = Some(v),
            SecretData::AzureConnector(v) => fields.azure_connector = Some(v),
            SecretData::AzureSdk(v) => fields.azure_sdk = Some(v),
            SecretData::Docker(v) => fields.docker = Some(v),
            SecretData::Dictionary(v) => fields.dictionary = Some(v),
            SecretData::Ecr(v) => fields.ecr = Some(v),
            SecretData::Gcp(v) => fields.gcp = Some(v),
            SecretData::Keypair(v) => fields.keypair = Some(v),
            SecretData::NatsAccount(v) => fields.nats_account = Some(v),
            SecretData::Opaque(v) => fields.opaque = Some(v),
            SecretData::Tls(v) => fields.tls = Some(v),
            SecretData::Userpass(v) => fields.userpass = Some(v),
        }
        fields
    }
}

/// Set an optional key: present when non-empty, `null` on update, omitted on
/// create.
fn put_optional(map: &mut Map<String, Value>, key: &str, value: Option<&str>, update: bool) {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => {
            map.insert(key.to_string(), Value::String(v.to_string()));
        }
        None if update => {
            map.insert(key.to_string(), Value::Null);
        }
        None => {}
    }
}

/// Copy key/value pairs, dropping empty values.
fn passthrough<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Value {
    Value::Object(
        pairs
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
    )
}

/// Build the remote `data` document for a secret.
///
/// With `update` set, optional keys that are empty locally are sent as
/// `null` so the server clears them.
pub fn build_data(data: &SecretData, update: bool) -> Value {
    match data {
        SecretData::Gcp(doc) | SecretData::Docker(doc) | SecretData::AzureSdk(doc) => {
            Value::String(doc.clone())
        }
        SecretData::Aws(aws) => {
            let mut map = Map::new();
            map.insert("secretKey".into(), Value::String(aws.secret_key.clone()));
            map.insert("accessKey".into(), Value::String(aws.access_key.clone()));
            put_optional(&mut map, "roleArn", aws.role_arn.as_deref(), update);
            Value::Object(map)
        }
        SecretData::Ecr(ecr) => {
            let mut map = Map::new();
            map.insert("secretKey".into(), Value::String(ecr.secret_key.clone()));
            map.insert("accessKey".into(), Value::String(ecr.access_key.clone()));
            put_optional(&mut map, "roleArn", ecr.role_arn.as_deref(), update);
            put_optional(&mut map, "externalId", ecr.external_id.as_deref(), update);
            if !ecr.repos.is_empty() {
                map.insert(
                    "repos".into(),
                    Value::Array(ecr.repos.iter().cloned().map(Value::String).collect()),
                );
            }
            Value::Object(map)
        }
        SecretData::Keypair(kp) => {
            let mut map = Map::new();
            map.insert("secretKey".into(), Value::String(kp.secret_key.clone()));
            put_optional(&mut map, "publicKey", kp.public_key.as_deref(), update);
            put_optional(&mut map, "passphrase", kp.passphrase.as_deref(), update);
            Value::Object(map)
        }
        SecretData::Tls(tls) => {
            let mut map = Map::new();
            map.insert("key".into(), Value::String(tls.key.clone()));
            put_optional(&mut map, "cert", Some(tls.cert.as_str()), update);
            put_optional(&mut map, "chain", tls.chain.as_deref(), update);
            Value::Object(map)
        }
        SecretData::NatsAccount(nats) => {
            let mut map = Map::new();
            map.insert("accountId".into(), Value::String(nats.account_id.clone()));
            map.insert("privateKey".into(), Value::String(nats.private_key.clone()));
            Value::Object(map)
        }
        SecretData::Opaque(o) => passthrough([
            ("payload", o.payload.as_str()),
            ("encoding", o.encoding.as_str()),
        ]),
        SecretData::Userpass(u) => passthrough([
            ("username", u.username.as_str()),
            ("password", u.password.as_str()),
            ("encoding", u.encoding.as_str()),
        ]),
        SecretData::AzureConnector(a) => {
            passthrough([("url", a.url.as_str()), ("code", a.code.as_str())])
        }
        SecretData::Dictionary(entries) => {
            passthrough(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        }
    }
}

/// Remote values as strings; non-string scalars keep their JSON text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    /// A required key; missing keys read as empty.
    fn text(&self, key: &str) -> String {
        self.0.get(key).and_then(as_text).unwrap_or_default()
    }

    /// An optional key; `null`, missing and empty all read as unset.
    fn optional(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(as_text)
            .filter(|v| !v.is_empty())
    }

    fn encoding(&self) -> String {
        self.optional("encoding").unwrap_or_else(default_encoding)
    }
}

/// Parse a remote `data` document back into local form.
///
/// # Errors
///
/// `ResourceError::InvalidSecretData` when a structured type's data is not
/// an object.
pub fn parse_data(secret_type: SecretType, value: &Value) -> Result<SecretData> {
    if secret_type.is_json_document() {
        let doc = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(match secret_type {
            SecretType::Gcp => SecretData::Gcp(doc),
            SecretType::Docker => SecretData::Docker(doc),
            _ => SecretData::AzureSdk(doc),
        });
    }

    let map = value
        .as_object()
        .ok_or_else(|| ResourceError::InvalidSecretData(secret_type.to_string()))?;
    let f = Fields(map);

    let data = match secret_type {
        SecretType::Aws => SecretData::Aws(AwsData {
            secret_key: f.text("secretKey"),
            access_key: f.text("accessKey"),
            role_arn: f.optional("roleArn"),
        }),
        SecretType::Ecr => SecretData::Ecr(EcrData {
            secret_key: f.text("secretKey"),
            access_key: f.text("accessKey"),
            role_arn: f.optional("roleArn"),
            external_id: f.optional("externalId"),
            repos: map
                .get("repos")
                .and_then(Value::as_array)
                .map(|repos| repos.iter().filter_map(as_text).collect())
                .unwrap_or_default(),
        }),
        SecretType::Keypair => SecretData::Keypair(KeypairData {
            secret_key: f.text("secretKey"),
            public_key: f.optional("publicKey"),
            passphrase: f.optional("passphrase"),
        }),
        SecretType::Tls => SecretData::Tls(TlsData {
            key: f.text("key"),
            cert: f.text("cert"),
            chain: f.optional("chain"),
        }),
        SecretType::NatsAccount => SecretData::NatsAccount(NatsAccountData {
            account_id: f.text("accountId"),
            private_key: f.text("privateKey"),
        }),
        SecretType::Opaque => SecretData::Opaque(OpaqueData {
            payload: f.text("payload"),
            encoding: f.encoding(),
        }),
        SecretType::Userpass => SecretData::Userpass(UserpassData {
            username: f.text("username"),
            password: f.text("password"),
            encoding: f.encoding(),
        }),
        SecretType::AzureConnector => SecretData::AzureConnector(AzureConnectorData {
            url: f.text("url"),
            code: f.text("code"),
        }),
        SecretType::Dictionary => SecretData::Dictionary(
            map.iter()
                .filter_map(|(k, v)| as_text(v).map(|v| (k.clone(), v)))
                .collect(),
        ),
        SecretType::Gcp | SecretType::Docker | SecretType::AzureSdk => {
            return Err(ResourceError::InvalidSecretData(secret_type.to_string()).into())
        }
    };

    Ok(data)
}
