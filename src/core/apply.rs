//! Reconcile engine.
//!
//! Drives the resource handlers the way a provider host would: every managed
//! resource is refreshed before it is compared with the manifest, resources
//! that left the manifest are deleted first, and the state file is updated
//! after each successful call so a failure part way leaves it accurate.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::core::client::ControlPlane;
use crate::core::manifest::Manifest;
use crate::core::resource::{DomainRouteResource, Resource, SecretResource};
use crate::core::state::StateFile;
use crate::core::types::Address;
use crate::error::{ResourceError, Result};

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Replace,
    Delete,
    /// Dropped from state because the remote object is gone.
    Forget,
    Import,
    NoOp,
}

impl Action {
    pub fn symbol(self) -> &'static str {
        match self {
            Action::Create => "+",
            Action::Update => "~",
            Action::Replace => "-/+",
            Action::Delete => "-",
            Action::Forget => "?",
            Action::Import => "<=",
            Action::NoOp => "=",
        }
    }
}

/// One entry of an apply, refresh or destroy report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub address: Address,
    pub action: Action,
}

impl Change {
    fn new(address: impl Into<Address>, action: Action) -> Self {
        Self {
            address: address.into(),
            action,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3} {}", self.action.symbol(), self.address)
    }
}

/// Count of changes per action, excluding no-ops.
pub fn summarize(changes: &[Change]) -> String {
    let count = |action: Action| changes.iter().filter(|c| c.action == action).count();

    format!(
        "{} created, {} updated, {} replaced, {} deleted",
        count(Action::Create),
        count(Action::Update),
        count(Action::Replace),
        count(Action::Delete),
    )
}

/// Reconciles a manifest against state and the control plane.
pub struct Engine<'a> {
    api: &'a dyn ControlPlane,
    state: &'a mut StateFile,
}

impl<'a> Engine<'a> {
    pub fn new(api: &'a dyn ControlPlane, state: &'a mut StateFile) -> Self {
        Self { api, state }
    }

    /// Bring the remote side in line with `manifest`.
    ///
    /// # Errors
    ///
    /// Stops at the first handler error. Changes made before it are already
    /// recorded in state.
    pub fn apply(&mut self, manifest: &Manifest) -> Result<Vec<Change>> {
        let secrets = manifest.resources::<SecretResource>()?;
        let routes = manifest.resources::<DomainRouteResource>()?;

        let mut changes = Vec::new();

        self.prune::<DomainRouteResource>(&routes, &mut changes)?;
        self.prune::<SecretResource>(&secrets, &mut changes)?;

        self.reconcile::<SecretResource>(&secrets, &mut changes)?;
        self.reconcile::<DomainRouteResource>(&routes, &mut changes)?;

        info!(summary = %summarize(&changes), "apply finished");
        Ok(changes)
    }

    /// Re-read every resource in state.
    pub fn refresh(&mut self) -> Result<Vec<Change>> {
        let mut changes = Vec::new();

        self.refresh_type::<SecretResource>(&mut changes)?;
        self.refresh_type::<DomainRouteResource>(&mut changes)?;

        Ok(changes)
    }

    /// Delete every resource in state.
    pub fn destroy(&mut self) -> Result<Vec<Change>> {
        let mut changes = Vec::new();

        self.prune::<DomainRouteResource>(&[], &mut changes)?;
        self.prune::<SecretResource>(&[], &mut changes)?;

        Ok(changes)
    }

    /// Import an existing remote object of a type given by name.
    pub fn import(&mut self, type_name: &str, id: &str) -> Result<Change> {
        if type_name == SecretResource::TYPE_NAME {
            self.import_as::<SecretResource>(id)
        } else if type_name == DomainRouteResource::TYPE_NAME {
            self.import_as::<DomainRouteResource>(id)
        } else {
            Err(ResourceError::UnknownType(type_name.to_string()).into())
        }
    }

    /// Import an existing remote object as `R`.
    ///
    /// # Errors
    ///
    /// `ResourceError::ImportNotFound` when the object does not exist and
    /// `ResourceError::AlreadyManaged` when its address is already in state.
    pub fn import_as<R: Resource>(&mut self, id: &str) -> Result<Change> {
        let skeleton = R::import(id)?;
        let address = R::state_address(&skeleton);

        if self.state.contains(&address) {
            return Err(ResourceError::AlreadyManaged(address).into());
        }

        let current = R::read(self.api, &skeleton)?.ok_or_else(|| ResourceError::ImportNotFound {
            kind: R::TYPE_NAME,
            id: id.to_string(),
        })?;

        let address = self.state.put::<R>(&current)?;
        info!(%address, "imported");
        Ok(Change::new(address, Action::Import))
    }

    /// Delete resources of type `R` that are in state but not in `desired`.
    fn prune<R: Resource>(
        &mut self,
        desired: &[(Address, R::Args)],
        changes: &mut Vec<Change>,
    ) -> Result<()> {
        let keep: BTreeSet<&str> = desired.iter().map(|(a, _)| a.as_str()).collect();

        for address in self.state.addresses_of::<R>() {
            if keep.contains(address.as_str()) {
                continue;
            }

            let Some(prior) = self.state.get::<R>(&address)? else {
                continue;
            };

            match R::delete(self.api, &prior) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    warn!(%address, "already deleted remotely");
                }
                Err(e) => return Err(e),
            }

            self.state.remove(&address);
            changes.push(Change::new(address, Action::Delete));
        }

        Ok(())
    }

    /// Create, update or replace every desired resource of type `R`.
    fn reconcile<R: Resource>(
        &mut self,
        desired: &[(Address, R::Args)],
        changes: &mut Vec<Change>,
    ) -> Result<()> {
        for (address, args) in desired {
            let current = match self.state.get::<R>(address)? {
                Some(prior) => R::read(self.api, &prior)?,
                None => None,
            };

            let change = match current {
                None => {
                    let created = R::create(self.api, args)?;
                    self.state.put::<R>(&created)?;
                    Change::new(address.clone(), Action::Create)
                }
                Some(current) if R::requires_replace(&current, args) => {
                    debug!(%address, "replacing");
                    R::delete(self.api, &current)?;
                    self.state.remove(address);
                    let created = R::create(self.api, args)?;
                    self.state.put::<R>(&created)?;
                    Change::new(address.clone(), Action::Replace)
                }
                Some(current) => {
                    let updated = R::update(self.api, &current, args)?;
                    let action = if updated == current {
                        Action::NoOp
                    } else {
                        Action::Update
                    };
                    self.state.put::<R>(&updated)?;
                    Change::new(address.clone(), action)
                }
            };

            changes.push(change);
        }

        Ok(())
    }

    fn refresh_type<R: Resource>(&mut self, changes: &mut Vec<Change>) -> Result<()> {
        for address in self.state.addresses_of::<R>() {
            let Some(prior) = self.state.get::<R>(&address)? else {
                continue;
            };

            match R::read(self.api, &prior)? {
                Some(current) => {
                    let action = if current == prior {
                        Action::NoOp
                    } else {
                        Action::Update
                    };
                    self.state.remove(&address);
                    self.state.put::<R>(&current)?;
                    changes.push(Change::new(address, action));
                }
                None => {
                    warn!(%address, "no longer exists remotely, removing from state");
                    self.state.remove(&address);
                    changes.push(Change::new(address, Action::Forget));
                }
            }
        }

        Ok(())
    }
}
