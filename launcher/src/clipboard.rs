//! Local clipboard access for the paste shortcut

use log::debug;

use crate::utils::command_stdout;

/// Source of clipboard text
pub trait Clipboard {
    /// Current text content, `None` when empty or not text
    fn read_text(&mut self) -> Option<String>;
}

/// Reads the desktop clipboard through `wl-paste`, falling back to `xclip`
#[derive(Debug, Default)]
pub struct SystemClipboard;

const READERS: &[(&str, &[&str])] = &[
    ("wl-paste", &["--no-newline", "--type", "text"]),
    ("xclip", &["-selection", "clipboard", "-o"]),
];

impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        for (program, args) in READERS {
            match command_stdout(program, args) {
                Ok(text) if !text.is_empty() => return Some(text),
                Ok(_) => debug!("{program} returned no text"),
                Err(e) => debug!("{program} unavailable: {e:#}"),
            }
        }
        None
    }
}
