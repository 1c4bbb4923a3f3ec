//! Registry of settings keys that may be overridden
//!
//! Registry size is configuration: the launcher builds it from its config
//! file and falls back to [`KeyRegistry::gnome`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::RegistryError;

/// Schema holding the GNOME Shell overlay (Super) key
pub const MUTTER_SCHEMA: &str = "org.gnome.mutter";

/// Schema holding window-manager keybinding lists
pub const WM_KEYBINDINGS_SCHEMA: &str = "org.gnome.desktop.wm.keybindings";

/// One settings entry, identified by `(namespace, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverrideKey {
    namespace: String,
    name: String,
}

impl OverrideKey {
    /// Create a key from its schema namespace and key name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Schema namespace, e.g. `org.gnome.mutter`
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key name within the namespace, e.g. `overlay-key`
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.namespace, self.name)
    }
}

/// Value written to a key to stop the host from acting on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisabledValue {
    /// Serialized empty string, for single-accelerator keys
    EmptyString,
    /// Serialized empty list, for keybinding lists
    EmptyList,
}

impl DisabledValue {
    /// Literal form understood by the settings store
    pub fn literal(self) -> &'static str {
        match self {
            Self::EmptyString => "''",
            Self::EmptyList => "[]",
        }
    }
}

/// Registry entry as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Schema namespace
    pub namespace: String,
    /// Key name
    pub name: String,
    /// How the key is disabled
    pub disabled: DisabledValue,
}

impl KeySpec {
    fn new(namespace: &str, name: &str, disabled: DisabledValue) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            disabled,
        }
    }

    /// The key this entry refers to
    pub fn key(&self) -> OverrideKey {
        OverrideKey::new(&self.namespace, &self.name)
    }
}

/// Ordered, duplicate-free set of keys this process knows how to override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRegistry {
    entries: Vec<(OverrideKey, DisabledValue)>,
}

impl KeyRegistry {
    /// Build a registry from configuration entries
    ///
    /// Rejects an empty list and duplicate `(namespace, name)` pairs.
    pub fn from_specs(specs: &[KeySpec]) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.namespace.trim().is_empty() || spec.name.trim().is_empty() {
                return Err(RegistryError::BlankField {
                    namespace: spec.namespace.clone(),
                    name: spec.name.clone(),
                });
            }
            let key = spec.key();
            if !seen.insert(key.clone()) {
                return Err(RegistryError::Duplicate(key));
            }
            entries.push((key, spec.disabled));
        }

        Ok(Self { entries })
    }

    /// The GNOME overlay key plus the four window/application switchers
    pub fn gnome() -> Self {
        Self {
            entries: Self::gnome_specs()
                .iter()
                .map(|spec| (spec.key(), spec.disabled))
                .collect(),
        }
    }

    /// Configuration form of [`KeyRegistry::gnome`]
    pub fn gnome_specs() -> Vec<KeySpec> {
        vec![
            KeySpec::new(MUTTER_SCHEMA, "overlay-key", DisabledValue::EmptyString),
            KeySpec::new(
                WM_KEYBINDINGS_SCHEMA,
                "switch-windows",
                DisabledValue::EmptyList,
            ),
            KeySpec::new(
                WM_KEYBINDINGS_SCHEMA,
                "switch-windows-backward",
                DisabledValue::EmptyList,
            ),
            KeySpec::new(
                WM_KEYBINDINGS_SCHEMA,
                "switch-applications",
                DisabledValue::EmptyList,
            ),
            KeySpec::new(
                WM_KEYBINDINGS_SCHEMA,
                "switch-applications-backward",
                DisabledValue::EmptyList,
            ),
        ]
    }

    /// Registered keys in registry order
    pub fn keys(&self) -> impl Iterator<Item = &OverrideKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Registered keys with their disabling values
    pub fn entries(&self) -> impl Iterator<Item = (&OverrideKey, DisabledValue)> {
        self.entries.iter().map(|(key, disabled)| (key, *disabled))
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty (never true for a validated registry)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
