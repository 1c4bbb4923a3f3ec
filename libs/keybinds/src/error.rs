//! Error types for settings access and override state transitions

use std::io;
use std::path::PathBuf;

use crate::registry::OverrideKey;

/// Failure talking to the external settings store
///
/// These are soft errors: the override manager logs them and moves on to the
/// next key instead of aborting the sequence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The store's command-line tool could not be started
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The store rejected the operation
    #[error("{program} {action} {key} failed ({status}): {stderr}")]
    Failed {
        /// Program that was invoked
        program: String,
        /// `get` or `set`
        action: &'static str,
        /// `namespace key` being accessed
        key: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// The store is not reachable (used by in-memory stores)
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reading, writing or deleting the recovery file
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    /// Recovery file could not be read
    #[error("Failed to read recovery file {}: {source}", path.display())]
    Read {
        /// Recovery file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Recovery file content is not a valid backup
    #[error("Malformed recovery file {}: {source}", path.display())]
    Parse {
        /// Recovery file path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Recovery file could not be written
    #[error("Failed to write recovery file {}: {source}", path.display())]
    Write {
        /// Recovery file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Recovery file could not be deleted
    #[error("Failed to remove recovery file {}: {source}", path.display())]
    Remove {
        /// Recovery file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Backup could not be serialized
    #[error("Failed to serialize backup: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Failure of an override state transition
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    /// `disable()` called while keys are already overridden
    #[error("Keybindings are already disabled")]
    AlreadyActive,

    /// Override requested after `shutdown()`
    #[error("Keybinding manager has been shut down")]
    ShutDown,

    /// Recovery file could not be persisted, loaded or removed
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

/// Invalid override key registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No keys configured
    #[error("override key registry is empty")]
    Empty,

    /// The same key is listed twice
    #[error("duplicate override key: {0}")]
    Duplicate(OverrideKey),

    /// An entry has a blank namespace or name
    #[error("override key has an empty namespace or name: '{namespace}' '{name}'")]
    BlankField {
        /// Namespace as configured
        namespace: String,
        /// Key name as configured
        name: String,
    },
}
