//! Domain objects and route editing.
//!
//! Routes are not first-class API objects: they live inside
//! `domain.spec.ports[].routes[]`. Adding, updating and removing a route means
//! editing the port list locally and patching it back, so the edits are plain
//! functions on [`Domain`] that the HTTP client and test doubles share.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::base::Base;
use crate::error::{ApiError, Error, ResourceError};

/// A domain as returned by `GET /org/{org}/domain/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(flatten)]
    pub base: Base,
    #[serde(default)]
    pub spec: DomainSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// Domain spec. Only the ports are interpreted; everything else is carried
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    #[serde(default)]
    pub ports: Vec<DomainPort>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A listening port on a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<DomainRoute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A prefix route on a domain port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRoute {
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_prefix: Option<String>,
    #[serde(default)]
    pub workload_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a route edit could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEditError {
    PortNotFound,
    RouteExists,
    RouteNotFound,
}

impl Domain {
    fn port_mut(&mut self, number: u16) -> Option<&mut DomainPort> {
        self.spec
            .ports
            .iter_mut()
            .find(|p| p.number == Some(number))
    }

    /// Find the route with `prefix` on port `number`.
    pub fn find_route(&self, number: u16, prefix: &str) -> Option<&DomainRoute> {
        self.spec
            .ports
            .iter()
            .filter(|p| p.number == Some(number))
            .flat_map(|p| p.routes.iter())
            .find(|r| r.prefix == prefix)
    }

    /// Append a route to a port. Prefixes are unique per port.
    pub fn add_route(&mut self, number: u16, route: DomainRoute) -> Result<(), RouteEditError> {
        let port = self.port_mut(number).ok_or(RouteEditError::PortNotFound)?;

        if port.routes.iter().any(|r| r.prefix == route.prefix) {
            return Err(RouteEditError::RouteExists);
        }

        port.routes.push(route);
        Ok(())
    }

    /// Replace the route with the same prefix.
    ///
    /// Remote fields this client does not model are kept from the existing
    /// route.
    pub fn update_route(&mut self, number: u16, route: DomainRoute) -> Result<(), RouteEditError> {
        let port = self.port_mut(number).ok_or(RouteEditError::PortNotFound)?;

        let existing = port
            .routes
            .iter_mut()
            .find(|r| r.prefix == route.prefix)
            .ok_or(RouteEditError::RouteNotFound)?;

        let mut extra = std::mem::take(&mut existing.extra);
        extra.extend(route.extra);
        *existing = DomainRoute { extra, ..route };

        Ok(())
    }

    /// Drop the route with `prefix` from a port.
    ///
    /// Returns `false` when there was nothing to remove.
    pub fn remove_route(&mut self, number: u16, prefix: &str) -> bool {
        let Some(port) = self.port_mut(number) else {
            return false;
        };

        let before = port.routes.len();
        port.routes.retain(|r| r.prefix != prefix);
        port.routes.len() != before
    }

    /// Body of the patch that writes the port list back.
    pub fn ports_patch(&self) -> Value {
        serde_json::json!({ "spec": { "ports": self.spec.ports } })
    }
}

/// Translate a route edit failure into a crate error.
///
/// Duplicate and missing routes are reported like the equivalent HTTP
/// statuses so callers can treat them the same way as API responses.
pub fn route_edit_error(
    kind: RouteEditError,
    domain: &str,
    number: u16,
    prefix: &str,
    path: &str,
) -> Error {
    let status = |status: u16, body: String| -> Error {
        ApiError::Status {
            status,
            method: "PATCH".to_string(),
            path: path.to_string(),
            body,
        }
        .into()
    };

    match kind {
        RouteEditError::PortNotFound => ResourceError::PortNotFound {
            domain: domain.to_string(),
            port: number,
        }
        .into(),
        RouteEditError::RouteExists => status(
            409,
            format!("route with prefix {} already exists on port {}", prefix, number),
        ),
        RouteEditError::RouteNotFound => status(
            404,
            format!("route with prefix {} not found on port {}", prefix, number),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn domain() -> Domain {
        serde_json::from_value(json!({
            "name": "example.com",
            "kind": "domain",
            "spec": {
                "dnsMode": "cname",
                "ports": [
                    {
                        "number": 443,
                        "protocol": "http2",
                        "routes": [
                            {
                                "prefix": "/api",
                                "workloadLink": "/org/acme/gvc/main/workload/api",
                                "port": 8080,
                                "headers": {"request": {"set": {"x-env": "prod"}}}
                            }
                        ]
                    },
                    {"number": 80, "protocol": "http"}
                ]
            }
        }))
        .unwrap()
    }

    fn route(prefix: &str) -> DomainRoute {
        DomainRoute {
            prefix: prefix.to_string(),
            workload_link: "/org/acme/gvc/main/workload/web".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_route() {
        let d = domain();
        let found = d.find_route(443, "/api").unwrap();
        assert_eq!(found.port, Some(8080));
        assert!(found.extra.contains_key("headers"));

        assert!(d.find_route(80, "/api").is_none());
        assert!(d.find_route(443, "/missing").is_none());
    }

    #[test]
    fn test_add_route() {
        let mut d = domain();
        d.add_route(80, route("/")).unwrap();
        assert!(d.find_route(80, "/").is_some());

        assert_eq!(d.add_route(443, route("/api")), Err(RouteEditError::RouteExists));
        assert_eq!(d.add_route(8443, route("/")), Err(RouteEditError::PortNotFound));
    }

    #[test]
    fn test_update_route_keeps_unmodelled_fields() {
        let mut d = domain();
        let mut updated = route("/api");
        updated.replace_prefix = Some("/".to_string());
        d.update_route(443, updated).unwrap();

        let found = d.find_route(443, "/api").unwrap();
        assert_eq!(found.replace_prefix.as_deref(), Some("/"));
        assert_eq!(found.workload_link, "/org/acme/gvc/main/workload/web");
        assert_eq!(found.port, None);
        assert!(found.extra.contains_key("headers"));

        assert_eq!(
            d.update_route(443, route("/nope")),
            Err(RouteEditError::RouteNotFound)
        );
    }

    #[test]
    fn test_remove_route() {
        let mut d = domain();
        assert!(d.remove_route(443, "/api"));
        assert!(d.find_route(443, "/api").is_none());
        assert!(!d.remove_route(443, "/api"));
        assert!(!d.remove_route(9999, "/api"));
    }

    #[test]
    fn test_ports_patch_preserves_port_fields() {
        let d = domain();
        let patch = d.ports_patch();
        assert_eq!(patch["spec"]["ports"][0]["protocol"], "http2");
        assert_eq!(patch["spec"]["ports"][0]["routes"][0]["workloadLink"], "/org/acme/gvc/main/workload/api");
        assert!(patch["spec"].get("dnsMode").is_none());
    }

    #[test]
    fn test_route_edit_error_statuses() {
        let path = "/org/acme/domain/example.com";
        let err = route_edit_error(RouteEditError::RouteExists, "example.com", 443, "/api", path);
        assert!(err.is_conflict());

        let err = route_edit_error(RouteEditError::RouteNotFound, "example.com", 443, "/api", path);
        assert!(err.is_not_found());

        let err = route_edit_error(RouteEditError::PortNotFound, "example.com", 8443, "/", path);
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "domain example.com has no port 8443");
    }
}
