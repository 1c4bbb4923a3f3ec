//! Crash-safe override of desktop window-manager keybindings
//!
//! While a remote desktop session is fullscreen, the host window manager must
//! stop grabbing shortcuts such as Alt-Tab and Super so they reach the remote
//! side. This crate captures the current values of a fixed set of settings
//! keys, persists them to a recovery file, blanks them, and later puts them
//! back.
//!
//! # Guarantees
//!
//! - **Backup before damage**: the recovery file is durably written before any
//!   key is changed, so a crash mid-disable is still recoverable.
//! - **Complete or absent**: a backup always covers every registered key.
//! - **Best effort writes**: a single key that fails to read or write is
//!   logged and skipped; the rest of the sequence still runs.
//! - **Recovery on next launch**: a recovery file found at startup means the
//!   previous process died with keys disabled, and it is restored before
//!   anything else happens.
//!
//! # Example Usage
//!
//! ```rust
//! use guacview_keybinds::test_utils::MemorySettings;
//! use guacview_keybinds::{KeyOverrideManager, KeyRegistry, RecoveryFile};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let settings = MemorySettings::with_gnome_defaults();
//! let recovery = RecoveryFile::new(dir.path().join("gnome-keybindings.json"));
//!
//! let mut manager = KeyOverrideManager::new(settings.clone(), KeyRegistry::gnome(), recovery);
//! manager.disable().unwrap();
//! assert_eq!(settings.value("org.gnome.mutter", "overlay-key").as_deref(), Some("''"));
//!
//! manager.restore().unwrap();
//! assert_eq!(settings.value("org.gnome.mutter", "overlay-key").as_deref(), Some("'Super_L'"));
//! ```

#![warn(missing_docs)]

pub mod backup;
pub mod error;
pub mod manager;
pub mod registry;
pub mod settings;
/// In-memory settings store for tests and doc examples
pub mod test_utils;

pub use backup::{KeyBackup, RecoveryFile};
pub use error::{OverrideError, RecoveryError, RegistryError, SettingsError};
pub use manager::{KeyOverrideManager, OverrideState, RestoreOutcome};
pub use registry::{DisabledValue, KeyRegistry, KeySpec, OverrideKey};
pub use settings::{Gsettings, SettingsGateway};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
