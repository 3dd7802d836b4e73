//! Resource schemas.
//!
//! A schema declares the attributes of a resource type: their type, whether
//! they are required, optional or computed, which ones force a new resource,
//! which ones are sensitive and how they are validated. Manifests are checked
//! against it before anything is sent to the API, and `show` uses it to
//! redact sensitive values.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::core::constants::{ECR_REPOS_MAX, ECR_REPOS_MIN, REDACTED};
use crate::core::diag::{Diagnostic, Diagnostics};
use crate::core::validation::{self, Validator};
use crate::error::ValidationError;

/// Value type of an attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttrType {
    String,
    /// Non-negative integer that fits a port number.
    Int,
    /// Map of string to string.
    Map,
    /// Set of unique strings.
    Set,
    /// Nested block with its own attributes.
    Block(&'static [Attribute]),
}

impl AttrType {
    fn describe(self) -> &'static str {
        match self {
            AttrType::String => "a string",
            AttrType::Int => "an integer between 0 and 65535",
            AttrType::Map => "a table of strings",
            AttrType::Set => "a list of strings",
            AttrType::Block(_) => "a table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Required,
    Optional,
    Computed,
}

/// A single attribute declaration.
#[derive(Clone, Copy)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttrType,
    pub mode: Mode,
    pub force_new: bool,
    pub sensitive: bool,
    /// Applied to string values, or to the keys of a map.
    pub validate: Option<Validator>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl Attribute {
    const fn new(name: &'static str, ty: AttrType, mode: Mode) -> Self {
        Self {
            name,
            ty,
            mode,
            force_new: false,
            sensitive: false,
            validate: None,
            min_items: None,
            max_items: None,
        }
    }

    pub const fn required(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, Mode::Required)
    }

    pub const fn optional(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, Mode::Optional)
    }

    pub const fn computed(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, Mode::Computed)
    }

    pub const fn force_new(self) -> Self {
        Self {
            force_new: true,
            ..self
        }
    }

    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    pub const fn validated(self, validate: Validator) -> Self {
        Self {
            validate: Some(validate),
            ..self
        }
    }

    pub const fn items(self, min: usize, max: usize) -> Self {
        Self {
            min_items: Some(min),
            max_items: Some(max),
            ..self
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("mode", &self.mode)
            .field("force_new", &self.force_new)
            .field("sensitive", &self.sensitive)
            .finish_non_exhaustive()
    }
}

/// Attributes of one resource type.
#[derive(Debug)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub attributes: &'static [Attribute],
    /// Attributes of which exactly one must be set.
    pub exactly_one_of: &'static [&'static str],
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of the attributes that force a new resource.
    pub fn force_new(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name)
    }
}

use self::AttrType::{Block, Int, Map, Set, String as Str};

pub static DOMAIN_ROUTE: ResourceSchema = ResourceSchema {
    type_name: "domain_route",
    attributes: &[
        Attribute::computed("id", Str),
        Attribute::required("domain_link", Str)
            .force_new()
            .validated(validation::validate_not_empty),
        Attribute::optional("domain_port", Int).force_new(),
        Attribute::required("prefix", Str)
            .force_new()
            .validated(validation::validate_not_empty),
        Attribute::optional("replace_prefix", Str),
        Attribute::required("workload_link", Str).validated(validation::validate_not_empty),
        Attribute::optional("port", Int),
    ],
    exactly_one_of: &[],
};

const AWS: &[Attribute] = &[
    Attribute::required("secret_key", Str).sensitive(),
    Attribute::required("access_key", Str)
        .sensitive()
        .validated(validation::validate_aws_access_key),
    Attribute::optional("role_arn", Str).validated(validation::validate_aws_role_arn),
];

const AZURE_CONNECTOR: &[Attribute] = &[
    Attribute::required("url", Str).sensitive(),
    Attribute::required("code", Str).sensitive(),
];

const ECR: &[Attribute] = &[
    Attribute::required("secret_key", Str).sensitive(),
    Attribute::required("access_key", Str).validated(validation::validate_aws_access_key),
    Attribute::optional("role_arn", Str).validated(validation::validate_aws_role_arn),
    Attribute::optional("external_id", Str),
    Attribute::required("repos", Set).items(ECR_REPOS_MIN, ECR_REPOS_MAX),
];

const KEYPAIR: &[Attribute] = &[
    Attribute::required("secret_key", Str).sensitive(),
    Attribute::optional("public_key", Str),
    Attribute::optional("passphrase", Str).sensitive(),
];

const NATS_ACCOUNT: &[Attribute] = &[
    Attribute::required("account_id", Str),
    Attribute::required("private_key", Str).sensitive(),
];

const OPAQUE: &[Attribute] = &[
    Attribute::required("payload", Str).sensitive(),
    Attribute::optional("encoding", Str).validated(validation::validate_encoding),
];

const TLS: &[Attribute] = &[
    Attribute::required("key", Str).sensitive(),
    Attribute::required("cert", Str),
    Attribute::optional("chain", Str),
];

const USERPASS: &[Attribute] = &[
    Attribute::required("username", Str).validated(validation::validate_not_empty),
    Attribute::required("password", Str)
        .sensitive()
        .validated(validation::validate_not_empty),
    Attribute::optional("encoding", Str).validated(validation::validate_encoding),
];

pub static SECRET: ResourceSchema = ResourceSchema {
    type_name: "secret",
    attributes: &[
        Attribute::computed("id", Str),
        Attribute::computed("cpln_id", Str),
        Attribute::required("name", Str)
            .force_new()
            .validated(validation::validate_name),
        Attribute::optional("description", Str).validated(validation::validate_description),
        Attribute::optional("tags", Map).validated(validation::validate_tag_key),
        Attribute::computed("self_link", Str),
        Attribute::computed("dictionary_as_envs", Map),
        Attribute::optional("aws", Block(AWS)),
        Attribute::optional("azure_connector", Block(AZURE_CONNECTOR)),
        Attribute::optional("azure_sdk", Str).sensitive(),
        Attribute::optional("docker", Str).sensitive(),
        Attribute::optional("dictionary", Map),
        Attribute::optional("ecr", Block(ECR)),
        Attribute::optional("gcp", Str).sensitive(),
        Attribute::optional("keypair", Block(KEYPAIR)),
        Attribute::optional("nats_account", Block(NATS_ACCOUNT)),
        Attribute::optional("opaque", Block(OPAQUE)),
        Attribute::optional("tls", Block(TLS)),
        Attribute::optional("userpass", Block(USERPASS)),
    ],
    exactly_one_of: &[
        "aws",
        "azure_connector",
        "azure_sdk",
        "docker",
        "dictionary",
        "ecr",
        "gcp",
        "keypair",
        "nats_account",
        "opaque",
        "tls",
        "userpass",
    ],
};

/// Every schema the provider knows.
pub fn all() -> [&'static ResourceSchema; 2] {
    [&DOMAIN_ROUTE, &SECRET]
}

/// Schema for a resource type name.
pub fn lookup(type_name: &str) -> Option<&'static ResourceSchema> {
    all().into_iter().find(|s| s.type_name == type_name)
}

/// Diagnostic for a failed validator, attributed to `path`.
fn violation(path: &str, err: ValidationError) -> Diagnostic {
    let summary = match err {
        ValidationError::Empty { .. } => "value cannot be empty".to_string(),
        ValidationError::Invalid { reason, .. } => reason,
        other => other.to_string(),
    };
    Diagnostic::error(summary).with_attribute(path)
}

fn is_set(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

/// Check a manifest entry against a schema.
///
/// `address` prefixes the attribute paths in the returned diagnostics.
pub fn validate(schema: &ResourceSchema, address: &str, value: &Value) -> Diagnostics {
    let mut diags = Diagnostics::new();

    let Some(object) = value.as_object() else {
        diags.push(Diagnostic::error("resource must be a table").with_attribute(address));
        return diags;
    };

    validate_attributes(schema.attributes, address, object, &mut diags);

    if !schema.exactly_one_of.is_empty() {
        let found = schema
            .exactly_one_of
            .iter()
            .filter(|name| is_set(object.get(**name)))
            .count();

        if found != 1 {
            diags.push(
                violation(
                    address,
                    ValidationError::ExactlyOneOf {
                        options: schema.exactly_one_of.to_vec(),
                        found,
                    },
                ),
            );
        }
    }

    diags
}

fn validate_attributes(
    attributes: &[Attribute],
    prefix: &str,
    object: &serde_json::Map<String, Value>,
    diags: &mut Diagnostics,
) {
    for key in object.keys() {
        if !attributes.iter().any(|a| a.name == key.as_str()) {
            diags.push(
                Diagnostic::error("unsupported attribute").with_attribute(format!("{}.{}", prefix, key)),
            );
        }
    }

    for attr in attributes {
        let path = format!("{}.{}", prefix, attr.name);
        let value = object.get(attr.name);

        match (attr.mode, is_set(value)) {
            (Mode::Computed, true) => {
                diags.push(
                    Diagnostic::error("attribute is computed and cannot be set").with_attribute(path),
                );
                continue;
            }
            (Mode::Required, false) => {
                diags.push(Diagnostic::error("required attribute is missing").with_attribute(path));
                continue;
            }
            (_, false) => continue,
            _ => {}
        }

        if let Some(value) = value {
            validate_value(attr, &path, value, diags);
        }
    }
}

fn validate_value(attr: &Attribute, path: &str, value: &Value, diags: &mut Diagnostics) {
    let type_error = |diags: &mut Diagnostics| {
        diags.push(
            Diagnostic::error(format!("must be {}", attr.ty.describe())).with_attribute(path),
        );
    };

    match attr.ty {
        AttrType::String => match value.as_str() {
            Some(s) => {
                if let Some(Err(e)) = attr.validate.map(|v| v(path, s)) {
                    diags.push(violation(path, e));
                }
            }
            None => type_error(diags),
        },
        AttrType::Int => {
            if value.as_u64().filter(|n| *n <= u64::from(u16::MAX)).is_none() {
                type_error(diags);
            }
        }
        AttrType::Map => match value.as_object() {
            Some(map) => {
                for (k, v) in map {
                    let entry = format!("{}.{}", path, k);
                    if !v.is_string() {
                        diags.push(Diagnostic::error("must be a string").with_attribute(entry));
                        continue;
                    }
                    if let Some(Err(e)) = attr.validate.map(|f| f(&entry, k)) {
                        diags.push(violation(&entry, e));
                    }
                }
            }
            None => type_error(diags),
        },
        AttrType::Set => match value.as_array() {
            Some(items) => validate_set(attr, path, items, diags),
            None => type_error(diags),
        },
        AttrType::Block(attributes) => match value.as_object() {
            Some(object) => validate_attributes(attributes, path, object, diags),
            None => type_error(diags),
        },
    }
}

fn validate_set(attr: &Attribute, path: &str, items: &[Value], diags: &mut Diagnostics) {
    let mut seen = BTreeSet::new();

    for item in items {
        let Some(s) = item.as_str() else {
            diags.push(Diagnostic::error("must be a list of strings").with_attribute(path));
            return;
        };
        if !seen.insert(s) {
            diags.push(Diagnostic::error(format!("duplicate value '{}'", s)).with_attribute(path));
        }
    }

    if let Some(min) = attr.min_items.filter(|min| items.len() < *min) {
        diags.push(
            Diagnostic::error(format!("must have at least {} item(s)", min)).with_attribute(path),
        );
    }

    if let Some(max) = attr.max_items.filter(|max| items.len() > *max) {
        diags.push(
            Diagnostic::error(format!("must have at most {} items", max)).with_attribute(path),
        );
    }
}

/// Replace every sensitive value in `value` with a placeholder.
pub fn redact(schema: &ResourceSchema, value: &mut Value) {
    redact_attributes(schema.attributes, value);
}

fn redact_attributes(attributes: &[Attribute], value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };

    for attr in attributes {
        let Some(field) = object.get_mut(attr.name) else {
            continue;
        };
        if field.is_null() {
            continue;
        }

        if attr.sensitive {
            *field = Value::String(REDACTED.to_string());
        } else if let AttrType::Block(nested) = attr.ty {
            redact_attributes(nested, field);
        }
    }
}
