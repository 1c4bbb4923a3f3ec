//! Access to the external key-value settings store
//!
//! The store is only ever touched one key at a time, synchronously. Every
//! failure is reported as a [`SettingsError`]; deciding to carry on is left
//! to the caller.

use crate::error::SettingsError;
use crate::registry::OverrideKey;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Get/set access to the settings store
pub trait SettingsGateway {
    /// Read the store's literal textual value for `key`
    ///
    /// Serialized forms are returned as-is (`''`, `[]`, `['<Alt>Tab']`).
    fn get(&self, key: &OverrideKey) -> Result<String, SettingsError>;

    /// Write the literal `value` to `key`
    fn set(&self, key: &OverrideKey, value: &str) -> Result<(), SettingsError>;
}

impl<T: SettingsGateway + ?Sized> SettingsGateway for &T {
    fn get(&self, key: &OverrideKey) -> Result<String, SettingsError> {
        (**self).get(key)
    }

    fn set(&self, key: &OverrideKey, value: &str) -> Result<(), SettingsError> {
        (**self).set(key, value)
    }
}

/// `gsettings` command-line backend
#[derive(Debug, Clone)]
pub struct Gsettings {
    program: PathBuf,
}

impl Default for Gsettings {
    fn default() -> Self {
        Self::new("gsettings")
    }
}

impl Gsettings {
    /// Use a specific `gsettings` binary (or a compatible stand-in)
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(
        &self,
        action: &'static str,
        key: &OverrideKey,
        value: Option<&str>,
    ) -> Result<String, SettingsError> {
        let program = self.program.display().to_string();
        let mut args = vec![action, key.namespace(), key.name()];
        if let Some(value) = value {
            args.push(value);
        }

        log::debug!("Running command: {} {}", program, args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| SettingsError::Spawn {
                program: program.clone(),
                source,
            })?;
        log_output(&output);

        if !output.status.success() {
            return Err(SettingsError::Failed {
                program,
                action,
                key: key.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn log_output(output: &Output) {
    log::debug!("Command exit status: {}", output.status);
    if !output.stdout.is_empty() {
        log::debug!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    }
    if !output.stderr.is_empty() {
        log::debug!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }
}

impl SettingsGateway for Gsettings {
    fn get(&self, key: &OverrideKey) -> Result<String, SettingsError> {
        self.run("get", key, None)
    }

    fn set(&self, key: &OverrideKey, value: &str) -> Result<(), SettingsError> {
        self.run("set", key, Some(value)).map(|_| ())
    }
}
