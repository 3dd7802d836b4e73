//! In-memory control plane.
//!
//! Stores domains and secrets the way the API does and records every call
//! and every secret payload it receives, so tests can assert both on the
//! resulting state and on what was sent.

use cpln_provider::core::client::{
    route_edit_error, Base, ControlPlane, Domain, DomainRoute, Link, Secret,
};
use cpln_provider::error::{ApiError, Error, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct FakeControlPlane {
    pub domains: RefCell<BTreeMap<String, Domain>>,
    pub secrets: RefCell<BTreeMap<String, Secret>>,
    /// `"{operation} {name}"` for every call, in order.
    pub calls: RefCell<Vec<String>>,
    /// JSON bodies of secret create and update calls.
    pub payloads: RefCell<Vec<Value>>,
}

fn status(code: u16, method: &str, path: String) -> Error {
    ApiError::Status {
        status: code,
        method: method.to_string(),
        path,
        body: String::new(),
    }
    .into()
}

fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(domain: Domain) -> Self {
        let fake = Self::new();
        fake.insert_domain(domain);
        fake
    }

    pub fn insert_domain(&self, domain: Domain) {
        let name = domain.base.name.clone().unwrap_or_default();
        self.domains.borrow_mut().insert(name, domain);
    }

    pub fn domain(&self, name: &str) -> Domain {
        self.domains.borrow()[name].clone()
    }

    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.secrets.borrow().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn last_payload(&self) -> Value {
        self.payloads
            .borrow()
            .last()
            .cloned()
            .expect("no secret payload recorded")
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
        self.payloads.borrow_mut().clear();
    }

    fn record(&self, operation: &str, name: &str) {
        self.calls.borrow_mut().push(format!("{} {}", operation, name));
    }

    fn edit_domain<F>(&self, name: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Domain, &str) -> Result<()>,
    {
        let path = format!("/org/acme/domain/{}", name);
        let mut domains = self.domains.borrow_mut();
        let domain = domains
            .get_mut(name)
            .ok_or_else(|| status(404, "GET", path.clone()))?;
        edit(domain, &path)
    }
}

impl ControlPlane for FakeControlPlane {
    fn get_domain(&self, name: &str) -> Result<Domain> {
        self.record("get_domain", name);
        self.domains
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| status(404, "GET", format!("/org/acme/domain/{}", name)))
    }

    fn add_domain_route(&self, domain: &str, port: u16, route: &DomainRoute) -> Result<()> {
        self.record("add_domain_route", domain);
        self.edit_domain(domain, |d, path| {
            d.add_route(port, route.clone())
                .map_err(|kind| route_edit_error(kind, domain, port, &route.prefix, path))
        })
    }

    fn update_domain_route(&self, domain: &str, port: u16, route: &DomainRoute) -> Result<()> {
        self.record("update_domain_route", domain);
        self.edit_domain(domain, |d, path| {
            d.update_route(port, route.clone())
                .map_err(|kind| route_edit_error(kind, domain, port, &route.prefix, path))
        })
    }

    fn remove_domain_route(&self, domain: &str, port: u16, prefix: &str) -> Result<()> {
        self.record("remove_domain_route", domain);
        self.edit_domain(domain, |d, _| {
            d.remove_route(port, prefix);
            Ok(())
        })
    }

    fn create_secret(&self, secret: &Secret) -> Result<Secret> {
        let name = secret.name().to_string();
        self.record("create_secret", &name);
        self.payloads
            .borrow_mut()
            .push(serde_json::to_value(secret)?);

        let mut secrets = self.secrets.borrow_mut();
        if secrets.contains_key(&name) {
            return Err(status(409, "POST", "/org/acme/secret".to_string()));
        }

        let stored = Secret {
            base: Base {
                id: Some(format!("id-{}", name)),
                name: Some(name.clone()),
                kind: Some("secret".to_string()),
                version: Some(1),
                description: secret.base.description.clone(),
                tags: secret.base.tags.clone(),
                links: vec![Link {
                    rel: "self".to_string(),
                    href: format!("/org/acme/secret/{}", name),
                }],
                ..Default::default()
            },
            secret_type: secret.secret_type,
            data: secret.data.clone(),
            data_replace: None,
        };
        secrets.insert(name, stored.clone());
        Ok(stored)
    }

    fn get_secret(&self, name: &str) -> Result<Secret> {
        self.record("get_secret", name);
        self.secrets
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| status(404, "GET", format!("/org/acme/secret/{}/-reveal", name)))
    }

    fn update_secret(&self, secret: &Secret) -> Result<Secret> {
        let name = secret.name().to_string();
        self.record("update_secret", &name);
        self.payloads
            .borrow_mut()
            .push(serde_json::to_value(secret)?);

        let mut secrets = self.secrets.borrow_mut();
        let stored = secrets
            .get_mut(&name)
            .ok_or_else(|| status(404, "PATCH", format!("/org/acme/secret/{}", name)))?;

        if let Some(description) = &secret.base.description {
            stored.base.description = Some(description.clone());
        }

        if let Some(changes) = &secret.base.tags {
            let tags = stored.base.tags.get_or_insert_with(BTreeMap::new);
            for (key, value) in changes {
                if value.is_null() {
                    tags.remove(key);
                } else {
                    tags.insert(key.clone(), value.clone());
                }
            }
        }

        if let Some(secret_type) = secret.secret_type {
            stored.secret_type = Some(secret_type);
        }

        if let Some(data) = &secret.data_replace {
            stored.data = Some(without_nulls(data.clone()));
        }

        stored.base.version = stored.base.version.map(|v| v + 1);
        Ok(stored.clone())
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        self.record("delete_secret", name);
        self.secrets
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| status(404, "DELETE", format!("/org/acme/secret/{}", name)))
    }
}
