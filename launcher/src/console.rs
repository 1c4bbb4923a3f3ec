//! Operator console on stdin
//!
//! Turns typed lines into the same [`AppEvent`]s a browser window would
//! post, so the launcher can be driven without one.

use std::io::{self, BufRead};
use std::thread::JoinHandle;

use crate::events::{AppEvent, UiHandle};
use crate::keys::{ChordError, KeyChord};

pub const HELP: &str = "\
Commands:
  fullscreen          toggle fullscreen (same as super+ctrl+f11)
  paste               paste the clipboard (same as super+ctrl+v)
  open <url>          load a URL
  new <url>           page asks for a new window
  loaded <url>        report a finished page load
  <chord>             key press, e.g. super+ctrl+f11
  quit                restore keybindings and exit";

/// A console line that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("'{0}' needs a URL")]
    MissingUrl(String),
    #[error("unknown command '{0}' (type 'help')")]
    UnknownCommand(String),
    #[error(transparent)]
    Chord(#[from] ChordError),
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Event(AppEvent),
    Help,
    Nothing,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let with_url = |make: fn(String) -> AppEvent| {
            if rest.is_empty() {
                Err(ConsoleError::MissingUrl(word.to_string()))
            } else {
                Ok(Self::Event(make(rest.to_string())))
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Ok(Self::Nothing),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Event(AppEvent::Shutdown)),
            "open" => with_url(AppEvent::Navigate),
            "new" => with_url(AppEvent::NewTarget),
            "loaded" => with_url(AppEvent::LoadChanged),
            "fullscreen" => Ok(Self::Event(chord("super+ctrl+f11")?)),
            "paste" => Ok(Self::Event(chord("super+ctrl+v")?)),
            _ if rest.is_empty() => Ok(Self::Event(chord(word)?)),
            _ => Err(ConsoleError::UnknownCommand(line.to_string())),
        }
    }
}

fn chord(text: &str) -> Result<AppEvent, ChordError> {
    text.parse::<KeyChord>().map(AppEvent::Key)
}

/// Read commands from `input` on a background thread until EOF or `quit`
pub fn spawn<R>(input: R, ui: UiHandle) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || read_commands(input, &ui))
}

fn read_commands<R: BufRead>(input: R, ui: &UiHandle) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Console input failed: {e}");
                return;
            }
        };

        match ConsoleCommand::parse(&line) {
            Ok(ConsoleCommand::Event(event)) => {
                let quit = event == AppEvent::Shutdown;
                if !ui.post(event) || quit {
                    return;
                }
            }
            Ok(ConsoleCommand::Help) => eprintln!("{HELP}"),
            Ok(ConsoleCommand::Nothing) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
    log::debug!("Console input closed");
}
