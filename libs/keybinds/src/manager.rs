//! Backup / disable / restore state machine
//!
//! ```text
//!            disable()                      restore() / shutdown()
//! Inactive ─────────────► Active ─────────────────────────► Inactive
//!   no backup               backup in memory and on disk       file deleted
//! ```
//!
//! The manager is owned by the UI thread and is not shared; a second thread
//! driving it would need the state wrapped in a mutex.

use crate::backup::{KeyBackup, RecoveryFile};
use crate::error::{OverrideError, RecoveryError};
use crate::registry::{KeyRegistry, OverrideKey};
use crate::settings::SettingsGateway;

/// Whether host keybindings are currently overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideState {
    /// No backup outstanding, no recovery file
    Inactive,
    /// Keys disabled; a backup exists in memory and on disk
    Active,
}

/// Result of a [`KeyOverrideManager::restore`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No backup in memory or on disk; nothing was written
    NothingToRestore,
    /// Every captured key was written back (some writes may have failed softly)
    Restored {
        /// Keys written back successfully
        written: usize,
        /// Keys whose write failed and was skipped
        failed: usize,
    },
}

/// Owns the override registry, the recovery file and the override state
pub struct KeyOverrideManager<S: SettingsGateway> {
    settings: S,
    registry: KeyRegistry,
    recovery: RecoveryFile,
    state: OverrideState,
    backup: Option<KeyBackup>,
    recovered_at_startup: bool,
    shut_down: bool,
}

impl<S: SettingsGateway> KeyOverrideManager<S> {
    /// Create the manager and immediately repair any previous unclean exit
    pub fn new(settings: S, registry: KeyRegistry, recovery: RecoveryFile) -> Self {
        let mut manager = Self {
            settings,
            registry,
            recovery,
            state: OverrideState::Inactive,
            backup: None,
            recovered_at_startup: false,
            shut_down: false,
        };
        manager.recovered_at_startup = manager.recover_from_crash();
        manager
    }

    /// Restore from a recovery file left by a previous process
    ///
    /// Returns `true` when a stale backup was found and written back. A
    /// malformed recovery file is logged and left in place; keys are not
    /// touched in that case.
    pub fn recover_from_crash(&mut self) -> bool {
        if self.state == OverrideState::Active || !self.recovery.exists() {
            return false;
        }

        log::warn!(
            "Previous session ended unexpectedly, restoring keybindings from {}",
            self.recovery.path().display()
        );

        match self.restore() {
            Ok(RestoreOutcome::Restored { written, failed }) => {
                log::info!("Recovered {written} keybinding(s) ({failed} failed)");
                true
            }
            Ok(RestoreOutcome::NothingToRestore) => false,
            Err(e) => {
                log::error!("Keybinding recovery abandoned: {e}");
                false
            }
        }
    }

    /// Back up every registered key, then disable them all
    ///
    /// The backup is on disk before the first destructive write. If it
    /// cannot be persisted, no key is changed and the state stays
    /// [`OverrideState::Inactive`].
    pub fn disable(&mut self) -> Result<(), OverrideError> {
        if self.shut_down {
            return Err(OverrideError::ShutDown);
        }
        if self.state == OverrideState::Active {
            return Err(OverrideError::AlreadyActive);
        }

        log::info!("Disabling host keybindings");

        let backup = KeyBackup::capture(&self.registry, |key| self.read_or_empty(key));
        debug_assert!(backup.covers(&self.registry));

        self.set_aside_unreadable_recovery_file();
        if let Err(e) = self.recovery.store(&backup) {
            log::error!("Not disabling keybindings, backup could not be saved: {e}");
            return Err(e.into());
        }
        log::info!(
            "Backed up {} keybinding(s) to {}",
            backup.len(),
            self.recovery.path().display()
        );

        self.backup = Some(backup);
        self.state = OverrideState::Active;

        for (key, disabled) in self.registry.entries() {
            Self::write_or_warn(&self.settings, key, disabled.literal());
        }

        Ok(())
    }

    /// Write the backed-up values back and delete the recovery file
    ///
    /// Uses the in-memory backup, or the recovery file when memory is empty.
    /// With neither present this is a no-op.
    pub fn restore(&mut self) -> Result<RestoreOutcome, OverrideError> {
        let backup = match self.backup.take() {
            Some(backup) => backup,
            None if self.recovery.exists() => self.recovery.load().inspect_err(|e| {
                log::error!("Cannot restore keybindings, recovery file unreadable: {e}");
            })?,
            None => {
                self.state = OverrideState::Inactive;
                return Ok(RestoreOutcome::NothingToRestore);
            }
        };

        log::info!("Restoring {} keybinding(s)", backup.len());

        let mut written = 0;
        let mut failed = 0;
        for (key, value) in backup.iter() {
            if Self::write_or_warn(&self.settings, &key, value) {
                written += 1;
            } else {
                failed += 1;
            }
        }

        self.state = OverrideState::Inactive;

        if let Err(e) = self.recovery.remove() {
            log::error!("Keybindings restored but {e}; the next launch will restore again");
            return Err(e.into());
        }

        Ok(RestoreOutcome::Restored { written, failed })
    }

    /// Final restore for every exit path; runs at most once
    ///
    /// Later calls do nothing and later [`disable`](Self::disable) calls are
    /// refused. Also invoked on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        match self.restore() {
            Ok(RestoreOutcome::Restored { written, failed }) => {
                log::info!("Restored {written} keybinding(s) on shutdown ({failed} failed)");
            }
            Ok(RestoreOutcome::NothingToRestore) => {}
            Err(e) => log::error!("Failed to restore keybindings on shutdown: {e}"),
        }
    }

    /// Current override state
    pub fn state(&self) -> OverrideState {
        self.state
    }

    /// Whether construction found and restored a stale recovery file
    pub fn recovered_at_startup(&self) -> bool {
        self.recovered_at_startup
    }

    /// Keys this manager overrides
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Recovery file this manager persists to
    pub fn recovery_file(&self) -> &RecoveryFile {
        &self.recovery
    }

    fn read_or_empty(&self, key: &OverrideKey) -> String {
        self.settings.get(key).unwrap_or_else(|e| {
            log::warn!("Failed to read {key}, backing up empty value: {e}");
            String::new()
        })
    }

    fn write_or_warn(settings: &S, key: &OverrideKey, value: &str) -> bool {
        match settings.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to set {key} to {value}: {e}");
                false
            }
        }
    }

    /// Keep a corrupt recovery file for inspection instead of overwriting it
    fn set_aside_unreadable_recovery_file(&self) {
        if !self.recovery.exists() {
            return;
        }
        match self.recovery.load() {
            Ok(_) => {}
            Err(RecoveryError::Parse { .. }) => match self.recovery.quarantine() {
                Ok(moved) => log::warn!("Moved unreadable recovery file to {}", moved.display()),
                Err(e) => log::error!("Failed to move unreadable recovery file: {e}"),
            },
            Err(e) => log::error!("{e}"),
        }
    }
}

impl<S: SettingsGateway> Drop for KeyOverrideManager<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySettings;
    use std::fs;
    use tempfile::TempDir;

    fn manager(
        settings: &MemorySettings,
        dir: &TempDir,
    ) -> KeyOverrideManager<MemorySettings> {
        KeyOverrideManager::new(
            settings.clone(),
            KeyRegistry::gnome(),
            RecoveryFile::new(dir.path().join("gnome-keybindings.json")),
        )
    }

    #[test]
    fn test_disable_sets_disabling_values() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = manager(&settings, &dir);

        mgr.disable().unwrap();

        assert_eq!(mgr.state(), OverrideState::Active);
        assert_eq!(settings.value("org.gnome.mutter", "overlay-key").as_deref(), Some("''"));
        for name in [
            "switch-windows",
            "switch-windows-backward",
            "switch-applications",
            "switch-applications-backward",
        ] {
            assert_eq!(
                settings
                    .value("org.gnome.desktop.wm.keybindings", name)
                    .as_deref(),
                Some("[]"),
                "{name}"
            );
        }
    }

    #[test]
    fn test_disable_twice_is_refused() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = manager(&settings, &dir);

        mgr.disable().unwrap();
        let writes = settings.write_count();

        assert!(matches!(mgr.disable(), Err(OverrideError::AlreadyActive)));
        assert_eq!(settings.write_count(), writes);

        // Backup still holds the original values, not the disabled ones
        let backup = mgr.recovery_file().load().unwrap();
        assert_eq!(
            backup.get(&OverrideKey::new("org.gnome.mutter", "overlay-key")),
            Some("'Super_L'")
        );
    }

    #[test]
    fn test_backup_persisted_before_first_write() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        let path = dir.path().join("gnome-keybindings.json");

        let backup_path = path.clone();
        settings.on_write(move |_, _| {
            assert!(backup_path.exists(), "setting written before backup persisted");
        });

        let mut mgr = manager(&settings, &dir);
        mgr.disable().unwrap();
        assert!(settings.write_count() > 0);
    }

    #[test]
    fn test_unwritable_backup_leaves_keys_untouched() {
        let dir = TempDir::new().unwrap();
        // Parent of the recovery file is a regular file, so the store fails
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = KeyOverrideManager::new(
            settings.clone(),
            KeyRegistry::gnome(),
            RecoveryFile::new(blocker.join("gnome-keybindings.json")),
        );

        assert!(matches!(mgr.disable(), Err(OverrideError::Recovery(_))));
        assert_eq!(mgr.state(), OverrideState::Inactive);
        assert_eq!(settings.write_count(), 0);
    }

    #[test]
    fn test_read_failure_backs_up_empty_value_and_continues() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        settings.fail_reads_of("org.gnome.desktop.wm.keybindings", "switch-windows");
        let mut mgr = manager(&settings, &dir);

        mgr.disable().unwrap();

        let backup = mgr.recovery_file().load().unwrap();
        assert!(backup.covers(mgr.registry()));
        assert_eq!(
            backup.get(&OverrideKey::new(
                "org.gnome.desktop.wm.keybindings",
                "switch-windows"
            )),
            Some("")
        );
        assert_eq!(settings.value("org.gnome.mutter", "overlay-key").as_deref(), Some("''"));
    }

    #[test]
    fn test_write_failure_does_not_abort_restore() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = manager(&settings, &dir);
        mgr.disable().unwrap();

        settings.fail_writes_of("org.gnome.desktop.wm.keybindings", "switch-applications");
        let outcome = mgr.restore().unwrap();

        assert_eq!(
            outcome,
            RestoreOutcome::Restored {
                written: 4,
                failed: 1
            }
        );
        assert_eq!(mgr.state(), OverrideState::Inactive);
        assert!(!mgr.recovery_file().exists());
        assert_eq!(
            settings.value("org.gnome.mutter", "overlay-key").as_deref(),
            Some("'Super_L'")
        );
    }

    #[test]
    fn test_restore_without_backup_is_noop() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = manager(&settings, &dir);

        assert_eq!(mgr.restore().unwrap(), RestoreOutcome::NothingToRestore);
        assert_eq!(settings.write_count(), 0);
        assert_eq!(mgr.state(), OverrideState::Inactive);
    }

    #[test]
    fn test_shutdown_runs_once_and_refuses_disable() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = manager(&settings, &dir);
        mgr.disable().unwrap();

        mgr.shutdown();
        let writes = settings.write_count();
        mgr.shutdown();

        assert_eq!(settings.write_count(), writes);
        assert!(matches!(mgr.disable(), Err(OverrideError::ShutDown)));
        assert!(!mgr.recovery_file().exists());
    }

    #[test]
    fn test_drop_restores_outstanding_backup() {
        let dir = TempDir::new().unwrap();
        let settings = MemorySettings::with_gnome_defaults();
        {
            let mut mgr = manager(&settings, &dir);
            mgr.disable().unwrap();
        }

        assert_eq!(
            settings.value("org.gnome.mutter", "overlay-key").as_deref(),
            Some("'Super_L'")
        );
        assert!(!dir.path().join("gnome-keybindings.json").exists());
    }

    #[test]
    fn test_disable_sets_aside_corrupt_recovery_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gnome-keybindings.json");
        fs::write(&path, "{ truncated").unwrap();

        let settings = MemorySettings::with_gnome_defaults();
        let mut mgr = manager(&settings, &dir);
        assert!(!mgr.recovered_at_startup());
        assert_eq!(settings.write_count(), 0);

        mgr.disable().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("gnome-keybindings.json.corrupt")).unwrap(),
            "{ truncated"
        );
        assert!(mgr.recovery_file().load().unwrap().covers(mgr.registry()));
    }
}
