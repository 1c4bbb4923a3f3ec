//! Captured key values and their on-disk recovery file
//!
//! File format: a JSON object mapping namespace to an object of key name to
//! the literal value captured from the settings store.
//!
//! ```json
//! {
//!   "org.gnome.desktop.wm.keybindings": { "switch-windows": "['<Alt>Tab']" },
//!   "org.gnome.mutter": { "overlay-key": "'Super_L'" }
//! }
//! ```

use crate::error::RecoveryError;
use crate::registry::{KeyRegistry, OverrideKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Prior values of every registered key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBackup {
    values: BTreeMap<String, BTreeMap<String, String>>,
}

impl KeyBackup {
    /// Capture a value for every key in `registry`
    ///
    /// `read` is called exactly once per key, so the result always covers
    /// the whole registry.
    pub fn capture<F>(registry: &KeyRegistry, mut read: F) -> Self
    where
        F: FnMut(&OverrideKey) -> String,
    {
        let mut backup = Self::default();
        for key in registry.keys() {
            let value = read(key);
            backup.insert(key, value);
        }
        backup
    }

    fn insert(&mut self, key: &OverrideKey, value: String) {
        self.values
            .entry(key.namespace().to_string())
            .or_default()
            .insert(key.name().to_string(), value);
    }

    /// Captured value for `key`
    pub fn get(&self, key: &OverrideKey) -> Option<&str> {
        self.values
            .get(key.namespace())
            .and_then(|keys| keys.get(key.name()))
            .map(String::as_str)
    }

    /// All `(key, value)` pairs, ordered by namespace then key name
    pub fn iter(&self) -> impl Iterator<Item = (OverrideKey, &str)> {
        self.values.iter().flat_map(|(namespace, keys)| {
            keys.iter()
                .map(move |(name, value)| (OverrideKey::new(namespace, name), value.as_str()))
        })
    }

    /// Number of captured keys
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the captured key set is exactly the registry's key set
    pub fn covers(&self, registry: &KeyRegistry) -> bool {
        self.len() == registry.len() && registry.keys().all(|key| self.get(key).is_some())
    }
}

/// Durable copy of a [`KeyBackup`] at a fixed path
///
/// Its existence at startup means the previous process exited with keys
/// still disabled.
#[derive(Debug, Clone)]
pub struct RecoveryFile {
    path: PathBuf,
}

impl RecoveryFile {
    /// Recovery file at `path` (not created until [`RecoveryFile::store`])
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the recovery file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a recovery file is present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the recovery file
    pub fn load(&self) -> Result<KeyBackup, RecoveryError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| RecoveryError::Read {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| RecoveryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the recovery file with `backup`
    ///
    /// Writes a sibling temp file, syncs it, then renames it over the target,
    /// so readers see either the old file or the complete new one.
    pub fn store(&self, backup: &KeyBackup) -> Result<(), RecoveryError> {
        let json = serde_json::to_string_pretty(backup).map_err(RecoveryError::Serialize)?;
        let write_err = |source| RecoveryError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = self.sibling("tmp");
        let mut file = fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        sync_parent_dir(&self.path);
        Ok(())
    }

    /// Delete the recovery file; an already-missing file is not an error
    pub fn remove(&self) -> Result<(), RecoveryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                sync_parent_dir(&self.path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(RecoveryError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Move an unreadable recovery file to `<name>.corrupt`
    ///
    /// Returns the new location.
    pub fn quarantine(&self) -> Result<PathBuf, RecoveryError> {
        let target = self.sibling("corrupt");
        fs::rename(&self.path, &target).map_err(|source| RecoveryError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

/// Best-effort fsync of the directory entry after rename/unlink
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = fs::File::open(parent)
        && let Err(e) = dir.sync_all()
    {
        log::debug!("Failed to sync directory {}: {e}", parent.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_backup() -> KeyBackup {
        KeyBackup::capture(&KeyRegistry::gnome(), |key| match key.name() {
            "overlay-key" => "'Super_L'".to_string(),
            "switch-windows" => "['<Alt>Tab']".to_string(),
            _ => "@as []".to_string(),
        })
    }

    #[test]
    fn test_capture_covers_registry() {
        let registry = KeyRegistry::gnome();
        let mut reads = 0;
        let backup = KeyBackup::capture(&registry, |_| {
            reads += 1;
            String::new()
        });

        assert_eq!(reads, registry.len());
        assert!(backup.covers(&registry));
    }

    #[test]
    fn test_covers_rejects_partial_backup() {
        let registry = KeyRegistry::gnome();
        let mut backup = KeyBackup::default();
        backup.insert(&OverrideKey::new("org.gnome.mutter", "overlay-key"), "''".into());

        assert!(!backup.covers(&registry));
    }

    #[test]
    fn test_json_shape_is_namespace_then_key() {
        let backup = sample_backup();
        let json: serde_json::Value = serde_json::to_value(&backup).unwrap();

        assert_eq!(json["org.gnome.mutter"]["overlay-key"], "'Super_L'");
        assert_eq!(
            json["org.gnome.desktop.wm.keybindings"]["switch-windows"],
            "['<Alt>Tab']"
        );
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let file = RecoveryFile::new(dir.path().join("cache").join("keys.json"));
        assert!(!file.exists());

        let backup = sample_backup();
        file.store(&backup).unwrap();

        assert!(file.exists());
        assert!(!dir.path().join("cache").join("keys.json.tmp").exists());
        assert_eq!(file.load().unwrap(), backup);
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let file = RecoveryFile::new(dir.path().join("keys.json"));
        file.remove().unwrap();
        file.remove().unwrap();
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.json");
        fs::write(&path, "{ not json").unwrap();

        let err = RecoveryFile::new(&path).load().unwrap_err();
        assert!(matches!(err, RecoveryError::Parse { .. }));
        assert!(err.to_string().contains("keys.json"));
    }

    #[test]
    fn test_quarantine_moves_file_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keys.json");
        fs::write(&path, "garbage").unwrap();

        let moved = RecoveryFile::new(&path).quarantine().unwrap();
        assert_eq!(moved, dir.path().join("keys.json.corrupt"));
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(moved).unwrap(), "garbage");
    }
}
