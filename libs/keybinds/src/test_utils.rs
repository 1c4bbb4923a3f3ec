//! In-memory [`SettingsGateway`] with failure injection
//!
//! Clones share the same store, so a test can hand one clone to the manager
//! and inspect the other.

use crate::error::SettingsError;
use crate::registry::{MUTTER_SCHEMA, OverrideKey, WM_KEYBINDINGS_SCHEMA};
use crate::settings::SettingsGateway;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type WriteHook = Arc<dyn Fn(&OverrideKey, &str) + Send + Sync>;

#[derive(Default)]
struct Store {
    values: HashMap<OverrideKey, String>,
    failing_reads: HashSet<OverrideKey>,
    failing_writes: HashSet<OverrideKey>,
    writes: Vec<(OverrideKey, String)>,
    on_write: Option<WriteHook>,
}

/// Shared in-memory settings store
#[derive(Clone, Default)]
pub struct MemorySettings {
    store: Arc<Mutex<Store>>,
}

impl MemorySettings {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with stock GNOME values for the default registry
    #[must_use]
    pub fn with_gnome_defaults() -> Self {
        let settings = Self::new();
        settings.insert(MUTTER_SCHEMA, "overlay-key", "'Super_L'");
        settings.insert(WM_KEYBINDINGS_SCHEMA, "switch-windows", "@as []");
        settings.insert(WM_KEYBINDINGS_SCHEMA, "switch-windows-backward", "@as []");
        settings.insert(
            WM_KEYBINDINGS_SCHEMA,
            "switch-applications",
            "['<Super>Tab', '<Alt>Tab']",
        );
        settings.insert(
            WM_KEYBINDINGS_SCHEMA,
            "switch-applications-backward",
            "['<Shift><Super>Tab', '<Shift><Alt>Tab']",
        );
        settings
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a value directly, without counting it as a write
    pub fn insert(&self, namespace: &str, name: &str, value: &str) {
        self.lock()
            .values
            .insert(OverrideKey::new(namespace, name), value.to_string());
    }

    /// Current value of a key
    #[must_use]
    pub fn value(&self, namespace: &str, name: &str) -> Option<String> {
        self.lock()
            .values
            .get(&OverrideKey::new(namespace, name))
            .cloned()
    }

    /// Make every `get` of this key fail
    pub fn fail_reads_of(&self, namespace: &str, name: &str) {
        self.lock()
            .failing_reads
            .insert(OverrideKey::new(namespace, name));
    }

    /// Make every `set` of this key fail
    pub fn fail_writes_of(&self, namespace: &str, name: &str) {
        self.lock()
            .failing_writes
            .insert(OverrideKey::new(namespace, name));
    }

    /// Call `hook` before each successful write is applied
    pub fn on_write<F>(&self, hook: F)
    where
        F: Fn(&OverrideKey, &str) + Send + Sync + 'static,
    {
        self.lock().on_write = Some(Arc::new(hook));
    }

    /// Number of successful `set` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Successful `set` calls in order
    #[must_use]
    pub fn writes(&self) -> Vec<(OverrideKey, String)> {
        self.lock().writes.clone()
    }
}

impl SettingsGateway for MemorySettings {
    fn get(&self, key: &OverrideKey) -> Result<String, SettingsError> {
        let store = self.lock();
        if store.failing_reads.contains(key) {
            return Err(SettingsError::Unavailable(format!("read of {key} refused")));
        }
        store
            .values
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::Unavailable(format!("no such key: {key}")))
    }

    fn set(&self, key: &OverrideKey, value: &str) -> Result<(), SettingsError> {
        let hook = {
            let store = self.lock();
            if store.failing_writes.contains(key) {
                return Err(SettingsError::Unavailable(format!("write of {key} refused")));
            }
            store.on_write.clone()
        };

        if let Some(hook) = hook {
            hook(key, value);
        }

        let mut store = self.lock();
        store.values.insert(key.clone(), value.to_string());
        store.writes.push((key.clone(), value.to_string()));
        Ok(())
    }
}
