//! State file.
//!
//! Records the last known state of every applied resource, keyed by address,
//! as JSON (`.cpln-state.json` by default). The file holds secret values, so
//! it is written with owner-only permissions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants::STATE_VERSION;
use crate::core::resource::Resource;
use crate::core::types::Address;
use crate::error::{Result, StateError};

/// One applied resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub state: Value,
}

/// The state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<Address, StoredResource>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load state from `path`. A missing file is an empty state.
    ///
    /// # Errors
    ///
    /// `StateError::Corrupt` if the file is not valid state JSON and
    /// `StateError::UnsupportedVersion` if it was written by a newer format.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| StateError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let state: Self = serde_json::from_str(&contents).map_err(|e| StateError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(state.version).into());
        }

        debug!(resources = state.resources.len(), "state loaded");
        Ok(state)
    }

    /// Write state to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), resources = self.resources.len(), "saving state");

        let write_err = |source| StateError::Write {
            path: path.display().to_string(),
            source,
        };

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{}\n", contents)).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        Ok(())
    }

    /// Typed state of the resource at `address`, if it is of type `R`.
    pub fn get<R: Resource>(&self, address: &str) -> Result<Option<R::State>> {
        match self.resources.get(address) {
            Some(stored) if stored.kind == R::TYPE_NAME => {
                Ok(Some(serde_json::from_value(stored.state.clone())?))
            }
            _ => Ok(None),
        }
    }

    /// Record the state of a resource under its address.
    pub fn put<R: Resource>(&mut self, state: &R::State) -> Result<Address> {
        let address = R::state_address(state);
        self.resources.insert(
            address.clone(),
            StoredResource {
                kind: R::TYPE_NAME.to_string(),
                state: serde_json::to_value(state)?,
            },
        );
        Ok(address)
    }

    pub fn remove(&mut self, address: &str) -> Option<StoredResource> {
        self.resources.remove(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.resources.contains_key(address)
    }

    /// Addresses of every resource of type `R`.
    pub fn addresses_of<R: Resource>(&self) -> Vec<Address> {
        self.resources
            .iter()
            .filter(|(_, stored)| stored.kind == R::TYPE_NAME)
            .map(|(address, _)| address.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Default state path next to a manifest.
pub fn default_path(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(crate::core::constants::STATE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::secret::{SecretFields, SecretState};
    use crate::core::resource::{DomainRouteResource, SecretResource};
    use tempfile::TempDir;

    fn secret(name: &str) -> SecretState {
        SecretState {
            id: name.to_string(),
            name: name.to_string(),
            fields: SecretFields {
                gcp: Some("{}".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::load(&dir.path().join("state.json")).unwrap();
        assert!(state.is_empty());
        assert_eq!(state.version, STATE_VERSION);
    }

    #[test]
    fn test_put_get_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut state = StateFile::default();
        let address = state.put::<SecretResource>(&secret("db")).unwrap();
        assert_eq!(address, "secret.db");
        state.save(&path).unwrap();

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(
            loaded.get::<SecretResource>("secret.db").unwrap(),
            Some(secret("db"))
        );
        assert_eq!(loaded.get::<DomainRouteResource>("secret.db").unwrap(), None);
        assert_eq!(loaded.addresses_of::<SecretResource>(), vec!["secret.db".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_with_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        StateFile::default().save(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_rejects_corrupt_and_future_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        std::fs::write(&path, "not json").unwrap();
        assert!(StateFile::load(&path).is_err());

        std::fs::write(&path, r#"{"version": 99, "resources": {}}"#).unwrap();
        let err = StateFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported state version 99"));
    }

    #[test]
    fn test_default_path_is_next_to_manifest() {
        assert_eq!(
            default_path(Path::new("infra/cpln.toml")),
            PathBuf::from("infra/.cpln-state.json")
        );
    }
}
