use crossbeam_channel::Sender;

use crate::keys::KeyChord;

/// Work queued onto the UI thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Navigate(String),      // Load a URL in the display surface
    NewTarget(String),     // Page asked to open a new window
    LoadChanged(String),   // Display surface finished a load step
    Key(KeyChord),         // Key press from the window
    Shutdown,              // Signal to exit the application
}

/// Cloneable handle for posting [`AppEvent`]s to the UI thread
///
/// Safe to use from any thread; events are handled in FIFO order.
#[derive(Clone, Debug)]
pub struct UiHandle {
    tx: Sender<AppEvent>,
}

impl UiHandle {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event; returns `false` once the UI loop has gone away
    pub fn post(&self, event: AppEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
