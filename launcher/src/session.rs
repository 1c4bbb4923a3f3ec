//! Session controller
//!
//! Owns the key override manager and the display surface on the UI thread.
//! Fullscreen toggles drive the manager; URLs from the redirect listener and
//! new-window requests arrive as queued [`AppEvent`]s and are applied here.

use crossbeam_channel::Receiver;
use guacview_keybinds::{KeyOverrideManager, OverrideState, RestoreOutcome, SettingsGateway};
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::clipboard::Clipboard;
use crate::display::{DisplaySurface, NavigationDecision};
use crate::events::{AppEvent, UiHandle};
use crate::keys::{KeyChord, Shortcut};
use crate::redirect::Handoff;

/// Escape text for a single-quoted script string literal
///
/// Backslashes are escaped first so the backslashes added for quotes and
/// newlines are not escaped again.
pub fn escape_for_script(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
}

/// Script that types `text` into the focused element of the remote session
pub fn insert_text_script(text: &str) -> String {
    format!(
        "document.execCommand('insertText', false, '{}');",
        escape_for_script(text)
    )
}

pub struct SessionController<S, D, C>
where
    S: SettingsGateway,
    D: DisplaySurface,
    C: Clipboard,
{
    manager: KeyOverrideManager<S>,
    surface: D,
    clipboard: C,
    ui: UiHandle,
    fullscreen: bool,
}

impl<S, D, C> SessionController<S, D, C>
where
    S: SettingsGateway,
    D: DisplaySurface,
    C: Clipboard,
{
    pub fn new(manager: KeyOverrideManager<S>, surface: D, clipboard: C, ui: UiHandle) -> Self {
        let fullscreen = surface.is_fullscreen();
        Self {
            manager,
            surface,
            clipboard,
            ui,
            fullscreen,
        }
    }

    /// Load the gateway login page
    pub fn start(&mut self, login_url: &str) {
        log::info!("Loading login page {login_url}");
        self.navigate(login_url);
    }

    /// Flip fullscreen; entering disables host keys, leaving restores them
    pub fn on_fullscreen_toggle(&mut self) {
        self.fullscreen = !self.fullscreen;

        if self.fullscreen {
            match self.manager.disable() {
                Ok(()) => log::info!("Entered fullscreen, host shortcuts disabled"),
                Err(e) => log::error!("Entered fullscreen but host shortcuts stay active: {e}"),
            }
        } else {
            match self.manager.restore() {
                Ok(RestoreOutcome::Restored { written, failed: 0 }) => {
                    log::info!("Left fullscreen, restored {written} host shortcuts");
                }
                Ok(RestoreOutcome::Restored { written, failed }) => {
                    log::warn!(
                        "Left fullscreen, restored {written} host shortcuts, {failed} could not be restored"
                    );
                }
                Ok(RestoreOutcome::NothingToRestore) => log::info!("Left fullscreen"),
                Err(e) => log::error!("Failed to restore host shortcuts: {e}"),
            }
        }

        self.surface.set_fullscreen(self.fullscreen);
    }

    /// Queue navigation to a client URL received from the redirect listener
    pub fn on_token_received(&self, url: String) {
        post_navigation(&self.ui, url);
    }

    /// Callback for the redirect listener; safe to call from its thread
    pub fn handoff(&self) -> Handoff {
        let ui = self.ui.clone();
        Arc::new(move |url| post_navigation(&ui, url))
    }

    /// Page asked for a new window; load it in this one instead
    pub fn on_create_new_target(&self, url: &str) -> bool {
        log::debug!("New window request for {url}, opening in place");
        post_navigation(&self.ui, url.to_string());
        true
    }

    pub fn on_navigation_decision(&self, url: &str) -> NavigationDecision {
        log::debug!("Navigation to {url} allowed");
        NavigationDecision::Allow
    }

    pub fn on_load_state_changed(&self, url: &str) {
        log::info!("Loaded {url}");
    }

    /// Handle a key press; returns `true` when it was a launcher shortcut
    pub fn on_key_event(&mut self, chord: &KeyChord) -> bool {
        match chord.shortcut() {
            Some(Shortcut::ToggleFullscreen) => {
                self.on_fullscreen_toggle();
                true
            }
            Some(Shortcut::PasteClipboard) => {
                self.on_paste_shortcut();
                true
            }
            None => false,
        }
    }

    fn on_paste_shortcut(&mut self) {
        match self.clipboard.read_text() {
            Some(text) => self.on_clipboard_paste_requested(&text),
            None => log::info!("Clipboard is empty or does not hold text"),
        }
    }

    /// Type `text` into the remote session
    pub fn on_clipboard_paste_requested(&mut self, text: &str) {
        if text.is_empty() {
            log::info!("Nothing to paste");
            return;
        }
        log::debug!("Pasting {} characters", text.chars().count());
        if let Err(e) = self.surface.run_script(&insert_text_script(text)) {
            log::warn!("Failed to paste clipboard: {e:#}");
        }
    }

    /// Apply one queued event
    pub fn handle(&mut self, event: AppEvent) -> ControlFlow<()> {
        match event {
            AppEvent::Navigate(url) => self.navigate(&url),
            AppEvent::NewTarget(url) => {
                self.on_create_new_target(&url);
            }
            AppEvent::LoadChanged(url) => self.on_load_state_changed(&url),
            AppEvent::Key(chord) => {
                if !self.on_key_event(&chord) {
                    log::debug!("Key {chord} passed through");
                }
            }
            AppEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Run the UI loop until shutdown or until every sender is gone
    pub fn run(&mut self, rx: &Receiver<AppEvent>) {
        for event in rx {
            if self.handle(event).is_break() {
                log::info!("Shutting down session...");
                break;
            }
        }
        self.shutdown();
    }

    /// Leave fullscreen and restore host keys; safe to call more than once
    pub fn shutdown(&mut self) {
        if self.fullscreen {
            self.fullscreen = false;
            self.surface.set_fullscreen(false);
        }
        self.manager.shutdown();
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn override_state(&self) -> OverrideState {
        self.manager.state()
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    fn navigate(&mut self, url: &str) {
        match self.surface.navigate_to(url) {
            Ok(()) => log::debug!("Navigated to {url}"),
            Err(e) => log::error!("Failed to load {url}: {e:#}"),
        }
    }
}

fn post_navigation(ui: &UiHandle, url: String) {
    if !ui.post(AppEvent::Navigate(url)) {
        log::warn!("UI loop has stopped, dropping navigation request");
    }
}
