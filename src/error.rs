//! Error types.
//!
//! Every fallible operation returns [`Result`]. Errors are grouped by the
//! layer that raises them so the CLI can attach a hint to the common ones.

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Provider configuration and manifest errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing provider setting: {field} (set it in [provider] or {env})")]
    MissingField {
        field: &'static str,
        env: &'static str,
    },

    #[error("invalid provider setting {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors returned by the control plane client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        status: u16,
        method: String,
        path: String,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Attribute validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{attribute}: value cannot be empty")]
    Empty { attribute: String },

    #[error("{attribute}: {reason}")]
    Invalid { attribute: String, reason: String },

    #[error("exactly one of {} must be set, found {found}", .options.join(", "))]
    ExactlyOneOf {
        options: Vec<&'static str>,
        found: usize,
    },
}

/// State file errors.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to read state {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("unsupported state version {0}")]
    UnsupportedVersion(u32),
}

/// Resource handler errors.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("{kind} '{name}' already exists in this org; import it or choose a different name")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("unable to extract secret type")]
    UnknownSecretType,

    #[error("invalid secret input or data type. Secret type: {0}")]
    InvalidSecretData(String),

    #[error("domain {domain} has no port {port}")]
    PortNotFound { domain: String, port: u16 },

    #[error("invalid import id '{id}': {reason}")]
    InvalidImportId { id: String, reason: String },

    #[error("unknown resource type: {0}")]
    UnknownType(String),

    #[error("cannot import {kind} '{id}': it does not exist")]
    ImportNotFound { kind: &'static str, id: String },

    #[error("{0} is already managed")]
    AlreadyManaged(String),
}

impl Error {
    /// HTTP status code carried by a client error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(ApiError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// True when the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True when the remote object already exists.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
