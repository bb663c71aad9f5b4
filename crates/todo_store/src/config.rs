//! The persisted BYOB configuration record.

use crate::backend::KeyValueBackend;
use crate::error::{StoreError, StoreResult};
use crate::record::{load_record, save_record, Record};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use todo_sync_protocol::CONTENT_TYPE_JSON;

/// Storage key of the [`Config`] record.
pub const CONFIG_KEY: &str = "config";

/// User configuration for "bring your own backend" sync.
///
/// The sync engine only reads this record; it is edited through
/// [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Endpoint used for `GET` snapshots and `POST` events.
    #[serde(default)]
    pub backend_url: String,
    /// Extra headers sent with every request.
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    /// Whether remote sync is enabled at all.
    #[serde(default, alias = "byob")]
    pub byob_enabled: bool,
    /// Default for `push`: overwrite a remote that appears to be ahead.
    #[serde(default)]
    pub force_push: bool,
    /// Whether the onboarding screen is shown. Kept for record compatibility.
    #[serde(default = "default_true")]
    pub show_onboarding: bool,
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string())])
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            headers: default_headers(),
            byob_enabled: false,
            force_push: false,
            show_onboarding: true,
        }
    }
}

impl Config {
    /// Creates an enabled configuration pointing at `url`.
    pub fn enabled(url: impl Into<String>) -> Self {
        Self {
            backend_url: url.into(),
            byob_enabled: true,
            ..Self::default()
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the force-push default.
    pub fn with_force_push(mut self, force: bool) -> Self {
        self.force_push = force;
        self
    }

    /// Returns true if remote sync should be attempted: BYOB is on and a
    /// backend URL is set.
    pub fn is_remote_enabled(&self) -> bool {
        self.byob_enabled && !self.backend_url.trim().is_empty()
    }
}

impl Record for Config {
    const KEY: &'static str = CONFIG_KEY;

    fn migrate(from_version: u32, mut data: Value) -> StoreResult<Value> {
        if from_version != 0 {
            return Ok(data);
        }
        let obj = data
            .as_object_mut()
            .ok_or_else(|| StoreError::Corrupted("config record is not an object".into()))?;
        if let Some(byob) = obj.remove("byob") {
            obj.entry("byobEnabled").or_insert(byob);
        }
        Ok(data)
    }
}

/// Read access to the current configuration.
pub trait ConfigSource: Send + Sync {
    /// Returns the configuration in effect now.
    fn current(&self) -> Config;
}

impl ConfigSource for Config {
    fn current(&self) -> Config {
        self.clone()
    }
}

impl ConfigSource for RwLock<Config> {
    fn current(&self) -> Config {
        self.read().clone()
    }
}

/// Persisted, editable configuration.
pub struct ConfigStore<B: KeyValueBackend> {
    backend: B,
    state: RwLock<Config>,
}

impl<B: KeyValueBackend> ConfigStore<B> {
    /// Opens the configuration, loading the persisted record or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be read.
    pub fn open(backend: B) -> StoreResult<Self> {
        let config = load_record::<Config, _>(&backend)?.unwrap_or_default();
        Ok(Self {
            backend,
            state: RwLock::new(config),
        })
    }

    /// Returns a copy of the configuration.
    pub fn config(&self) -> Config {
        self.state.read().clone()
    }

    /// Sets the backend URL.
    pub fn set_backend_url(&self, url: impl Into<String>) -> StoreResult<()> {
        let url = url.into();
        self.commit(|config| config.backend_url = url)
    }

    /// Adds or replaces a header.
    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) -> StoreResult<()> {
        let (name, value) = (name.into(), value.into());
        self.commit(|config| {
            config.headers.insert(name, value);
        })
    }

    /// Removes a header. Removing an absent header is not an error.
    pub fn remove_header(&self, name: &str) -> StoreResult<()> {
        self.commit(|config| {
            config.headers.remove(name);
        })
    }

    /// Enables or disables BYOB mode.
    pub fn set_byob(&self, enabled: bool) -> StoreResult<()> {
        self.commit(|config| config.byob_enabled = enabled)
    }

    /// Flips BYOB mode and returns the new value.
    pub fn toggle_byob(&self) -> StoreResult<bool> {
        self.commit(|config| {
            config.byob_enabled = !config.byob_enabled;
            config.byob_enabled
        })
    }

    /// Flips the force-push default and returns the new value.
    pub fn toggle_force_push(&self) -> StoreResult<bool> {
        self.commit(|config| {
            config.force_push = !config.force_push;
            config.force_push
        })
    }

    fn commit<R>(&self, edit: impl FnOnce(&mut Config) -> R) -> StoreResult<R> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let result = edit(&mut next);
        save_record(&self.backend, &next)?;
        *state = next;
        Ok(result)
    }
}

impl<B: KeyValueBackend> ConfigSource for ConfigStore<B> {
    fn current(&self) -> Config {
        self.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use std::sync::Arc;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.backend_url, "");
        assert_eq!(
            config.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(!config.byob_enabled);
        assert!(!config.force_push);
        assert!(config.show_onboarding);
        assert!(!config.is_remote_enabled());
    }

    #[test]
    fn remote_enabled_needs_flag_and_url() {
        assert!(Config::enabled("http://localhost:3001/api").is_remote_enabled());
        assert!(!Config::enabled("   ").is_remote_enabled());

        let mut config = Config::enabled("http://localhost:3001/api");
        config.byob_enabled = false;
        assert!(!config.is_remote_enabled());
    }

    #[test]
    fn edits_persist() {
        let backend = Arc::new(InMemoryBackend::new());
        {
            let store = ConfigStore::open(backend.clone()).unwrap();
            store.set_backend_url("http://localhost:3001/api").unwrap();
            store.add_header("Authorization", "Bearer abc").unwrap();
            assert!(store.toggle_byob().unwrap());
            assert!(store.toggle_force_push().unwrap());
        }
        let store = ConfigStore::open(backend).unwrap();
        let config = store.current();
        assert_eq!(config.backend_url, "http://localhost:3001/api");
        assert_eq!(config.headers.len(), 2);
        assert!(config.byob_enabled);
        assert!(config.force_push);

        store.remove_header("Authorization").unwrap();
        store.remove_header("Authorization").unwrap();
        assert_eq!(store.config().headers.len(), 1);
    }

    #[test]
    fn legacy_byob_key_migrates() {
        let legacy = br#"{"backendUrl": "http://x", "headers": {}, "byob": true,
                          "showOnboarding": false, "forcePush": false}"#;
        let store = ConfigStore::open(InMemoryBackend::with_entry(CONFIG_KEY, legacy)).unwrap();
        let config = store.config();
        assert!(config.byob_enabled);
        assert!(config.headers.is_empty());
        assert!(!config.show_onboarding);
    }

    #[test]
    fn failed_write_keeps_previous_config() {
        let store = ConfigStore::open(InMemoryBackend::new()).unwrap();
        store.backend.set_fail_writes(true);
        assert!(store.set_byob(true).is_err());
        assert!(!store.config().byob_enabled);
    }
}
