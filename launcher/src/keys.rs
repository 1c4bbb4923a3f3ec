//! Key events delivered by the display surface and the launcher's shortcuts

use std::fmt;
use std::str::FromStr;

/// Modifier state of a key event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "one flag per modifier key")]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

/// Key that was pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    F11,
    Char(char),
    Named(String),
}

/// A key together with its modifiers, e.g. `super+ctrl+f11`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: Key,
}

/// Launcher actions bound to key chords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// `Super+Ctrl+F11`
    ToggleFullscreen,
    /// `Super+Ctrl+V`
    PasteClipboard,
}

impl KeyChord {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Shortcut this chord triggers, if any
    pub fn shortcut(&self) -> Option<Shortcut> {
        if !(self.modifiers.super_key && self.modifiers.ctrl) {
            return None;
        }
        match self.key {
            Key::F11 => Some(Shortcut::ToggleFullscreen),
            Key::Char('v' | 'V') => Some(Shortcut::PasteClipboard),
            _ => None,
        }
    }
}

/// Why a chord string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordError {
    #[error("empty key in '{0}'")]
    EmptyPart(String),
    #[error("more than one key in '{0}'")]
    MultipleKeys(String),
    #[error("no key in '{0}'")]
    NoKey(String),
}

impl FromStr for KeyChord {
    type Err = ChordError;

    /// Single characters are folded to lowercase so `super+ctrl+V` and
    /// `super+ctrl+v` are the same chord
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::default();
        let mut key = None;

        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "" => return Err(ChordError::EmptyPart(s.to_string())),
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "super" | "meta" | "win" => modifiers.super_key = true,
                _ if key.is_some() => return Err(ChordError::MultipleKeys(s.to_string())),
                "f11" => key = Some(Key::F11),
                _ => {
                    let mut chars = part.chars();
                    key = Some(match (chars.next(), chars.next()) {
                        (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                        _ => Key::Named(part.to_string()),
                    });
                }
            }
        }

        key.map(|key| Self::new(modifiers, key))
            .ok_or_else(|| ChordError::NoKey(s.to_string()))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (on, name) in [
            (m.super_key, "super"),
            (m.ctrl, "ctrl"),
            (m.alt, "alt"),
            (m.shift, "shift"),
        ] {
            if on {
                write!(f, "{name}+")?;
            }
        }
        match &self.key {
            Key::F11 => write!(f, "f11"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Named(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fullscreen_chord() {
        let chord: KeyChord = "super+ctrl+f11".parse().unwrap();
        assert!(chord.modifiers.super_key && chord.modifiers.ctrl);
        assert_eq!(chord.key, Key::F11);
        assert_eq!(chord.shortcut(), Some(Shortcut::ToggleFullscreen));
    }

    #[test]
    fn test_paste_chord_either_case() {
        for text in ["ctrl+super+v", "Super+Ctrl+V"] {
            let chord: KeyChord = text.parse().unwrap();
            assert_eq!(chord.shortcut(), Some(Shortcut::PasteClipboard), "{text}");
        }
    }

    #[test]
    fn test_shortcuts_need_both_modifiers() {
        for text in ["ctrl+f11", "super+f11", "f11", "alt+tab", "super+ctrl+tab"] {
            let chord: KeyChord = text.parse().unwrap();
            assert_eq!(chord.shortcut(), None, "{text}");
        }
    }

    #[test]
    fn test_letter_case_does_not_change_chord() {
        let upper: KeyChord = "Super+Ctrl+V".parse().unwrap();
        let lower: KeyChord = "super+ctrl+v".parse().unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.key, Key::Char('v'));
        assert_eq!(upper.to_string(), "super+ctrl+v");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "super+ctrl".parse::<KeyChord>(),
            Err(ChordError::NoKey("super+ctrl".to_string()))
        );
        assert_eq!(
            "a+b".parse::<KeyChord>(),
            Err(ChordError::MultipleKeys("a+b".to_string()))
        );
        assert_eq!(
            "ctrl++v".parse::<KeyChord>(),
            Err(ChordError::EmptyPart("ctrl++v".to_string()))
        );
    }

    #[test]
    fn test_display_is_parseable() {
        let chord: KeyChord = "shift+alt+Tab".parse().unwrap();
        assert_eq!(chord.to_string(), "alt+shift+Tab");
        assert_eq!(chord.to_string().parse::<KeyChord>().unwrap(), chord);
    }
}
