//! Domain route resource.
//!
//! A route attaches a path prefix to a workload on one port of a domain. It
//! is identified by `(domain_link, domain_port, prefix)`, all of which force
//! a new resource when changed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::client::{name_from_self_link, ControlPlane, DomainRoute};
use crate::core::constants::DEFAULT_DOMAIN_PORT;
use crate::core::resource::{non_empty, Resource};
use crate::core::schema::{self, ResourceSchema};
use crate::core::types::{Address, ResourceId};
use crate::error::{ResourceError, Result};

fn default_domain_port() -> u16 {
    DEFAULT_DOMAIN_PORT
}

/// Desired route as written in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRouteArgs {
    pub domain_link: String,
    #[serde(default = "default_domain_port")]
    pub domain_port: u16,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_prefix: Option<String>,
    pub workload_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Applied route as recorded in state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRouteState {
    pub id: ResourceId,
    pub domain_link: String,
    #[serde(default = "default_domain_port")]
    pub domain_port: u16,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_prefix: Option<String>,
    #[serde(default)]
    pub workload_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl DomainRouteState {
    /// Name of the owning domain.
    pub fn domain_name(&self) -> &str {
        name_from_self_link(&self.domain_link)
    }
}

/// Id of a route: `{domain_link}_{domain_port}_{prefix}`.
pub fn route_id(domain_link: &str, domain_port: u16, prefix: &str) -> ResourceId {
    format!("{}_{}_{}", domain_link, domain_port, prefix)
}

/// Split an import id into `(domain_link, domain_port, prefix)`.
///
/// The domain link ends at the first underscore followed by a port number
/// and another underscore, so prefixes may contain underscores.
pub fn parse_import_id(id: &str) -> Result<(String, u16, String)> {
    let invalid = |reason: &str| ResourceError::InvalidImportId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    for (idx, _) in id.match_indices('_') {
        let (link, rest) = (&id[..idx], &id[idx + 1..]);
        let Some((port, prefix)) = rest.split_once('_') else {
            continue;
        };
        let Ok(port) = port.parse::<u16>() else {
            continue;
        };

        if link.is_empty() {
            return Err(invalid("domain link is empty").into());
        }
        if prefix.is_empty() {
            return Err(invalid("prefix is empty").into());
        }

        return Ok((link.to_string(), port, prefix.to_string()));
    }

    Err(invalid("expected {domain_link}_{domain_port}_{prefix}").into())
}

/// Remote route for the given arguments.
///
/// An empty replace prefix and a zero port are sent as absent.
pub fn route_from_args(args: &DomainRouteArgs) -> DomainRoute {
    DomainRoute {
        prefix: args.prefix.clone(),
        replace_prefix: non_empty(args.replace_prefix.as_deref()),
        workload_link: args.workload_link.clone(),
        port: args.port.filter(|p| *p != 0),
        ..Default::default()
    }
}

/// Map a remote route into local state. `None` clears the identity.
pub fn set_domain_route(
    domain_link: &str,
    domain_port: u16,
    route: Option<&DomainRoute>,
) -> Option<DomainRouteState> {
    route.map(|r| route_state(domain_link, domain_port, r))
}

fn route_state(domain_link: &str, domain_port: u16, route: &DomainRoute) -> DomainRouteState {
    DomainRouteState {
        id: route_id(domain_link, domain_port, &route.prefix),
        domain_link: domain_link.to_string(),
        domain_port,
        prefix: route.prefix.clone(),
        replace_prefix: route.replace_prefix.clone(),
        workload_link: route.workload_link.clone(),
        port: route.port,
    }
}

/// Attach the route to its domain port.
pub fn create(api: &dyn ControlPlane, args: &DomainRouteArgs) -> Result<DomainRouteState> {
    let domain = name_from_self_link(&args.domain_link);
    let route = route_from_args(args);

    info!(domain, port = args.domain_port, prefix = %args.prefix, "creating domain route");

    match api.add_domain_route(domain, args.domain_port, &route) {
        Ok(()) => {}
        Err(e) if e.is_conflict() => {
            return Err(ResourceError::AlreadyExists {
                kind: "domain route",
                name: route_id(&args.domain_link, args.domain_port, &args.prefix),
            }
            .into())
        }
        Err(e) => return Err(e),
    }

    Ok(route_state(&args.domain_link, args.domain_port, &route))
}

/// Re-read the route from its domain.
///
/// A missing domain, port or prefix all mean the route is gone.
pub fn read(api: &dyn ControlPlane, state: &DomainRouteState) -> Result<Option<DomainRouteState>> {
    let domain = match api.get_domain(state.domain_name()) {
        Ok(domain) => domain,
        Err(e) if e.is_not_found() => {
            debug!(domain = state.domain_name(), "domain is gone");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let route = domain.find_route(state.domain_port, &state.prefix);
    if route.is_none() {
        debug!(id = %state.id, "route no longer on domain");
    }

    Ok(set_domain_route(&state.domain_link, state.domain_port, route))
}

/// Replace the route when its target changed.
pub fn update(
    api: &dyn ControlPlane,
    prior: &DomainRouteState,
    args: &DomainRouteArgs,
) -> Result<DomainRouteState> {
    let route = route_from_args(args);

    let changed = prior.replace_prefix != route.replace_prefix
        || prior.workload_link != route.workload_link
        || prior.port != route.port;

    if !changed {
        debug!(id = %prior.id, "domain route unchanged");
        return Ok(prior.clone());
    }

    info!(id = %prior.id, "updating domain route");

    api.update_domain_route(prior.domain_name(), prior.domain_port, &route)?;

    Ok(route_state(&prior.domain_link, prior.domain_port, &route))
}

/// Detach the route from its domain port.
pub fn delete(api: &dyn ControlPlane, state: &DomainRouteState) -> Result<()> {
    info!(id = %state.id, "deleting domain route");
    api.remove_domain_route(state.domain_name(), state.domain_port, &state.prefix)
}

/// State skeleton for an import id, completed by [`read`].
pub fn import(id: &str) -> Result<DomainRouteState> {
    let (domain_link, domain_port, prefix) = parse_import_id(id)?;

    Ok(DomainRouteState {
        id: id.to_string(),
        domain_link,
        domain_port,
        prefix,
        replace_prefix: None,
        workload_link: String::new(),
        port: None,
    })
}

/// The `domain_route` resource type.
pub struct DomainRouteResource;

impl Resource for DomainRouteResource {
    const TYPE_NAME: &'static str = "domain_route";

    type Args = DomainRouteArgs;
    type State = DomainRouteState;

    fn schema() -> &'static ResourceSchema {
        &schema::DOMAIN_ROUTE
    }

    fn address(args: &DomainRouteArgs) -> Address {
        format!(
            "{}.{}",
            Self::TYPE_NAME,
            route_id(&args.domain_link, args.domain_port, &args.prefix)
        )
    }

    fn state_address(state: &DomainRouteState) -> Address {
        format!(
            "{}.{}",
            Self::TYPE_NAME,
            route_id(&state.domain_link, state.domain_port, &state.prefix)
        )
    }

    fn create(api: &dyn ControlPlane, args: &DomainRouteArgs) -> Result<DomainRouteState> {
        create(api, args)
    }

    fn read(api: &dyn ControlPlane, state: &DomainRouteState) -> Result<Option<DomainRouteState>> {
        read(api, state)
    }

    fn update(
        api: &dyn ControlPlane,
        prior: &DomainRouteState,
        args: &DomainRouteArgs,
    ) -> Result<DomainRouteState> {
        update(api, prior, args)
    }

    fn delete(api: &dyn ControlPlane, state: &DomainRouteState) -> Result<()> {
        delete(api, state)
    }

    fn import(id: &str) -> Result<DomainRouteState> {
        import(id)
    }
}
