//! Hotkey strings
//!
//! Hotkeys are written `mod+shift+enter`: `+`-separated modifiers followed by
//! one key. `mod` is the platform command key (Cmd on macOS, Ctrl elsewhere).
//! Strings are parsed once when the rule tables are built; key events are
//! matched against the parsed values.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Modifier keys as a bitfield
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b0001);
    pub const SHIFT: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    pub const META: Modifiers = Modifiers(0b1000);

    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The platform command modifier (Cmd on macOS, Ctrl elsewhere)
    pub fn cmd() -> Modifiers {
        if cfg!(target_os = "macos") {
            Modifiers::META
        } else {
            Modifiers::CTRL
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A logical key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key, normalized to lowercase
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    Space,
}

impl Key {
    fn parse(name: &str) -> Option<Key> {
        let key = match name {
            "enter" | "return" => Key::Enter,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "space" => Key::Space,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Enter => f.write_str("enter"),
            Key::Backspace => f.write_str("backspace"),
            Key::Delete => f.write_str("delete"),
            Key::Tab => f.write_str("tab"),
            Key::Escape => f.write_str("escape"),
            Key::Space => f.write_str("space"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("Empty hotkey")]
    Empty,

    #[error("Unknown modifier '{modifier}' in hotkey '{hotkey}'")]
    UnknownModifier { hotkey: String, modifier: String },

    #[error("Unknown key '{key}' in hotkey '{hotkey}'")]
    UnknownKey { hotkey: String, key: String },
}

/// A key press delivered by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        let key = match key {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        };
        Self { key, modifiers }
    }

    /// A press with no modifiers
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

/// A parsed hotkey
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Hotkey {
    /// Parse `mod+shift+k` style strings (case-insensitive)
    pub fn parse(s: &str) -> Result<Hotkey, HotkeyError> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Err(HotkeyError::Empty);
        }

        let parts: Vec<&str> = lowered.split('+').collect();
        let (key_part, modifier_parts) = parts.split_last().ok_or(HotkeyError::Empty)?;

        let mut modifiers = Modifiers::NONE;
        for part in modifier_parts {
            modifiers = modifiers
                | match *part {
                    "mod" => Modifiers::cmd(),
                    "ctrl" | "control" => Modifiers::CTRL,
                    "shift" => Modifiers::SHIFT,
                    "alt" | "option" | "opt" => Modifiers::ALT,
                    "cmd" | "meta" | "super" => Modifiers::META,
                    other => {
                        return Err(HotkeyError::UnknownModifier {
                            hotkey: s.to_string(),
                            modifier: other.to_string(),
                        })
                    }
                };
        }

        let key = Key::parse(key_part).ok_or_else(|| HotkeyError::UnknownKey {
            hotkey: s.to_string(),
            key: key_part.to_string(),
        })?;

        Ok(Hotkey { key, modifiers })
    }

    /// Exact match: the same key with exactly these modifiers held
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.key && self.modifiers == event.modifiers
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hotkey::parse(s)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Modifiers::CTRL, "ctrl"),
            (Modifiers::SHIFT, "shift"),
            (Modifiers::ALT, "alt"),
            (Modifiers::META, "meta"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}
