//! Control plane API client.
//!
//! Resource handlers talk to the API through the [`ControlPlane`] trait so
//! they can be exercised against an in-memory double. [`Client`] is the
//! blocking HTTP implementation.
//!
//! ## Adding an Operation
//!
//! 1. Add the method to `ControlPlane`
//! 2. Implement it on `Client` using `send`/`get_json`
//! 3. Implement it on the test double in `tests/support`

use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::config::ProviderConfig;
use crate::error::{ApiError, Result};

pub mod base;
pub mod domain;
pub mod secret;

pub use base::{name_from_self_link, Base, Link};
pub use domain::{route_edit_error, Domain, DomainPort, DomainRoute, DomainSpec, RouteEditError};
pub use secret::{Secret, SecretType};

/// Remote operations used by the resource handlers.
///
/// Every failure that came from an HTTP response carries its status code,
/// available through [`crate::error::Error::status`].
pub trait ControlPlane {
    /// Fetch a domain by name.
    fn get_domain(&self, name: &str) -> Result<Domain>;

    /// Attach a route to a domain port.
    ///
    /// # Errors
    ///
    /// Status 409 when the prefix is already routed on that port,
    /// `ResourceError::PortNotFound` when the port does not exist.
    fn add_domain_route(&self, domain: &str, port: u16, route: &DomainRoute) -> Result<()>;

    /// Replace the route with the same prefix on a domain port.
    fn update_domain_route(&self, domain: &str, port: u16, route: &DomainRoute) -> Result<()>;

    /// Detach the route with `prefix` from a domain port.
    fn remove_domain_route(&self, domain: &str, port: u16, prefix: &str) -> Result<()>;

    /// Create a secret and return it as stored.
    fn create_secret(&self, secret: &Secret) -> Result<Secret>;

    /// Fetch a secret including its data.
    fn get_secret(&self, name: &str) -> Result<Secret>;

    /// Patch a secret and return it as stored.
    fn update_secret(&self, secret: &Secret) -> Result<Secret>;

    /// Delete a secret.
    fn delete_secret(&self, name: &str) -> Result<()>;
}

/// User-Agent sent with every request.
pub fn user_agent() -> String {
    format!("cpln-provider/{}", env!("CARGO_PKG_VERSION"))
}

/// Blocking HTTP client for the control plane API.
pub struct Client {
    http: HttpClient,
    config: ProviderConfig,
}

impl Client {
    /// Build a client for the configured endpoint and org.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(user_agent())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Org-scoped path of a domain.
    fn domain_path(&self, name: &str) -> String {
        format!("{}/domain/{}", self.config.org_path(), name)
    }

    /// Org-scoped path of a secret.
    fn secret_path(&self, name: &str) -> String {
        format!("{}/secret/{}", self.config.org_path(), name)
    }

    /// Send a request and fail on any non-success status.
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let url = format!("{}/{}", self.config.endpoint, path.trim_start_matches('/'));
        trace!(%method, %url, "sending request");

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header("Authorization", self.config.token.as_str());
        if let Some(payload) = body {
            builder = builder.json(payload);
        }

        let response = builder
            .send()
            .map_err(|e| ApiError::Transport(format!("{} {}: {}", method, path, e)))?;

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                method: method.to_string(),
                path: path.to_string(),
                body,
            }
            .into());
        }

        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None)?;
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(format!("GET {}: {}", path, e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ApiError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Fetch a domain, apply `edit` to it and write its ports back.
    fn edit_domain<F>(&self, name: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Domain, &str) -> Result<bool>,
    {
        let path = self.domain_path(name);
        let mut domain = self.get_domain(name)?;

        if !edit(&mut domain, &path)? {
            debug!(domain = name, "route edit was a no-op, skipping patch");
            return Ok(());
        }

        self.send(Method::PATCH, &path, Some(&domain.ports_patch()))?;
        Ok(())
    }
}

impl ControlPlane for Client {
    fn get_domain(&self, name: &str) -> Result<Domain> {
        self.get_json(&self.domain_path(name))
    }

    fn add_domain_route(&self, domain: &str, port: u16, route: &DomainRoute) -> Result<()> {
        debug!(domain, port, prefix = %route.prefix, "adding domain route");
        self.edit_domain(domain, |d, path| {
            d.add_route(port, route.clone())
                .map_err(|kind| route_edit_error(kind, domain, port, &route.prefix, path))?;
            Ok(true)
        })
    }

    fn update_domain_route(&self, domain: &str, port: u16, route: &DomainRoute) -> Result<()> {
        debug!(domain, port, prefix = %route.prefix, "updating domain route");
        self.edit_domain(domain, |d, path| {
            d.update_route(port, route.clone())
                .map_err(|kind| route_edit_error(kind, domain, port, &route.prefix, path))?;
            Ok(true)
        })
    }

    fn remove_domain_route(&self, domain: &str, port: u16, prefix: &str) -> Result<()> {
        debug!(domain, port, prefix, "removing domain route");
        self.edit_domain(domain, |d, _| Ok(d.remove_route(port, prefix)))
    }

    fn create_secret(&self, secret: &Secret) -> Result<Secret> {
        debug!(name = secret.name(), "creating secret");
        let path = format!("{}/secret", self.config.org_path());
        let body = serde_json::to_value(secret)?;
        self.send(Method::POST, &path, Some(&body))?;
        self.get_secret(secret.name())
    }

    fn get_secret(&self, name: &str) -> Result<Secret> {
        self.get_json(&format!("{}/-reveal", self.secret_path(name)))
    }

    fn update_secret(&self, secret: &Secret) -> Result<Secret> {
        debug!(name = secret.name(), "updating secret");
        let body = serde_json::to_value(secret)?;
        self.send(Method::PATCH, &self.secret_path(secret.name()), Some(&body))?;
        self.get_secret(secret.name())
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        debug!(name, "deleting secret");
        self.send(Method::DELETE, &self.secret_path(name), None)?;
        Ok(())
    }
}
