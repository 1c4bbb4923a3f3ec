//! Display surface seen by the session controller
//!
//! The real browser window is outside this crate. [`ExternalBrowser`] stands
//! in for it by handing URLs to the desktop's default browser.

use anyhow::Result;
use log::{debug, info, warn};

use crate::utils::run_command;

/// Outcome of a navigation policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Deny,
}

/// Operations the controller performs on the window
///
/// Only ever called from the UI thread.
pub trait DisplaySurface {
    fn navigate_to(&mut self, url: &str) -> Result<()>;

    fn run_script(&mut self, code: &str) -> Result<()>;

    fn is_fullscreen(&self) -> bool;

    fn set_fullscreen(&mut self, fullscreen: bool);
}

/// Opens pages in the default browser via `xdg-open`
///
/// Script execution is not available through an external browser; fullscreen
/// is tracked as a flag so the override keys still follow the toggle.
#[derive(Debug)]
pub struct ExternalBrowser {
    opener: String,
    fullscreen: bool,
}

impl Default for ExternalBrowser {
    fn default() -> Self {
        Self::new("xdg-open")
    }
}

impl ExternalBrowser {
    pub fn new(opener: impl Into<String>) -> Self {
        Self {
            opener: opener.into(),
            fullscreen: false,
        }
    }
}

impl DisplaySurface for ExternalBrowser {
    fn navigate_to(&mut self, url: &str) -> Result<()> {
        info!("Opening {url}");
        let output = run_command(&self.opener, &[url])?;
        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                self.opener,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn run_script(&mut self, code: &str) -> Result<()> {
        warn!("External browser cannot run scripts; dropping {} bytes", code.len());
        debug!("Dropped script: {code}");
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        info!(
            "Window {} fullscreen",
            if fullscreen { "entering" } else { "leaving" }
        );
        self.fullscreen = fullscreen;
    }
}
