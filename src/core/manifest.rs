//! Manifest of desired resources.
//!
//! The manifest is a TOML file (`cpln.toml` by default):
//!
//! ```toml
//! [provider]
//! org = "acme"
//!
//! [[secret]]
//! name = "db"
//! opaque = { payload = "s3cr3t" }
//!
//! [[domain_route]]
//! domain_link = "/org/acme/domain/example.com"
//! prefix = "/api"
//! workload_link = "/org/acme/gvc/main/workload/api"
//! ```
//!
//! Entries are kept as raw values until they pass schema validation, then
//! deserialized into each resource's argument type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::core::config::ProviderSettings;
use crate::core::diag::{Diagnostic, Diagnostics};
use crate::core::resource::{DomainRouteResource, Resource, SecretResource};
use crate::core::schema;
use crate::core::types::Address;
use crate::error::{ConfigError, Result};

/// Parsed manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secret: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_route: Vec<Value>,
}

impl Manifest {
    /// Load a manifest from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ManifestNotFound` if the file doesn't exist,
    /// or `ConfigError::Parse` if the TOML is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading manifest");

        if !path.exists() {
            return Err(ConfigError::ManifestNotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&contents)
    }

    /// Parse manifest text.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;

        debug!(
            secrets = manifest.secret.len(),
            domain_routes = manifest.domain_route.len(),
            "manifest loaded"
        );

        Ok(manifest)
    }

    /// Raw entries for a resource type.
    pub fn entries(&self, type_name: &str) -> &[Value] {
        match type_name {
            "secret" => &self.secret,
            "domain_route" => &self.domain_route,
            _ => &[],
        }
    }

    /// Validate every entry against its schema and check that no two entries
    /// share an address.
    pub fn validate(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let mut seen = BTreeSet::new();

        self.validate_type::<SecretResource>(&mut diags, &mut seen);
        self.validate_type::<DomainRouteResource>(&mut diags, &mut seen);
        self.check_org_links(&mut diags);

        diags
    }

    /// Warn about routes on domains outside the configured org.
    fn check_org_links(&self, diags: &mut Diagnostics) {
        let Some(org) = self.provider.org.as_deref() else {
            return;
        };
        let scope = format!("/org/{}/", org);

        for (index, entry) in self.domain_route.iter().enumerate() {
            let Some(link) = entry.get("domain_link").and_then(Value::as_str) else {
                continue;
            };
            if !link.starts_with(&scope) {
                diags.push(
                    Diagnostic::warning(format!("domain is outside org {}", org))
                        .with_detail(link)
                        .with_attribute(format!("domain_route[{}].domain_link", index)),
                );
            }
        }
    }

    fn validate_type<R: Resource>(&self, diags: &mut Diagnostics, seen: &mut BTreeSet<Address>) {
        let schema = R::schema();

        for (index, entry) in self.entries(R::TYPE_NAME).iter().enumerate() {
            let label = format!("{}[{}]", R::TYPE_NAME, index);

            let found = schema::validate(schema, &label, entry);
            let failed = found.has_errors();
            diags.extend(found);
            if failed {
                continue;
            }

            match serde_json::from_value::<R::Args>(entry.clone()) {
                Ok(args) => {
                    let address = R::address(&args);
                    if !seen.insert(address.clone()) {
                        diags.push(
                            Diagnostic::error("duplicate resource")
                                .with_detail(address)
                                .with_attribute(label),
                        );
                    }
                }
                Err(e) => {
                    diags.push(Diagnostic::error(e.to_string()).with_attribute(label));
                }
            }
        }
    }

    /// Typed arguments for every entry of `R`, keyed by address.
    ///
    /// Call [`Manifest::validate`] first; this only reports the first
    /// deserialization failure.
    pub fn resources<R: Resource>(&self) -> Result<Vec<(Address, R::Args)>> {
        self.entries(R::TYPE_NAME)
            .iter()
            .map(|entry| {
                let args: R::Args = serde_json::from_value(entry.clone())?;
                Ok((R::address(&args), args))
            })
            .collect()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.secret.len() + self.domain_route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
