//! Constants used throughout the provider.
//!
//! Centralizes magic strings and configuration values.

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "cpln.toml";

/// Default state file name.
pub const STATE_FILE: &str = ".cpln-state.json";

/// State file format version.
pub const STATE_VERSION: u32 = 1;

/// Control plane API endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.cpln.io";

/// HTTP timeout in seconds used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Domain port a route attaches to when none is given.
pub const DEFAULT_DOMAIN_PORT: u16 = 443;

/// Encoding applied to opaque and userpass secrets when none is given.
pub const DEFAULT_ENCODING: &str = "plain";

/// Prefix of the env-var reference to a dictionary secret key.
pub const SECRET_REFERENCE_PREFIX: &str = "cpln://secret/";

/// Environment variable overriding the organization.
pub const ENV_ORG: &str = "CPLN_ORG";

/// Environment variable overriding the API endpoint.
pub const ENV_ENDPOINT: &str = "CPLN_ENDPOINT";

/// Environment variable holding the API token.
pub const ENV_TOKEN: &str = "CPLN_TOKEN";

/// Environment variable overriding the HTTP timeout.
pub const ENV_TIMEOUT: &str = "CPLN_TIMEOUT";

/// Environment variable holding the log filter.
pub const ENV_LOG: &str = "CPLN_PROVIDER_LOG";

/// Environment variable selecting the log format (`json` or text).
pub const ENV_LOG_FORMAT: &str = "CPLN_PROVIDER_LOG_FORMAT";

/// Longest accepted resource name.
pub const MAX_NAME_LEN: usize = 64;

/// Longest accepted description.
pub const MAX_DESCRIPTION_LEN: usize = 250;

/// Bounds on the number of ECR repositories.
pub const ECR_REPOS_MIN: usize = 1;
pub const ECR_REPOS_MAX: usize = 20;

/// Value shown in place of sensitive attributes.
pub const REDACTED: &str = "(sensitive)";
