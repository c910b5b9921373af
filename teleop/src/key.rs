use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::KeyParseError;

/// Non-character keys the event source can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialKey {
    Esc,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Tab,
    Backspace,
}

impl SpecialKey {
    const ALL: [SpecialKey; 9] = [
        SpecialKey::Esc,
        SpecialKey::Up,
        SpecialKey::Down,
        SpecialKey::Left,
        SpecialKey::Right,
        SpecialKey::Space,
        SpecialKey::Enter,
        SpecialKey::Tab,
        SpecialKey::Backspace,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SpecialKey::Esc => "esc",
            SpecialKey::Up => "up",
            SpecialKey::Down => "down",
            SpecialKey::Left => "left",
            SpecialKey::Right => "right",
            SpecialKey::Space => "space",
            SpecialKey::Enter => "enter",
            SpecialKey::Tab => "tab",
            SpecialKey::Backspace => "backspace",
        }
    }
}

/// Physical key identifier: a plain character or a named special key.
///
/// Characters are kept lowercase so that a binding on `'t'` matches
/// whether or not shift is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyId {
    Char(char),
    Special(SpecialKey),
}

impl KeyId {
    pub fn char(c: char) -> Self {
        KeyId::Char(c.to_lowercase().next().unwrap_or(c))
    }

    /// Same key with any character folded to the lowercase form events carry.
    pub fn normalized(self) -> Self {
        match self {
            KeyId::Char(c) => KeyId::char(c),
            special => special,
        }
    }
}

impl From<SpecialKey> for KeyId {
    fn from(key: SpecialKey) -> Self {
        KeyId::Special(key)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Char(c) => write!(f, "{}", c),
            KeyId::Special(key) => f.write_str(key.name()),
        }
    }
}

impl FromStr for KeyId {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyId::char(c));
        }
        let lowered = s.trim().to_ascii_lowercase();
        let name = match lowered.as_str() {
            "escape" => "esc",
            "return" => "enter",
            other => other,
        };
        SpecialKey::ALL
            .iter()
            .find(|key| key.name() == name)
            .map(|&key| KeyId::Special(key))
            .ok_or_else(|| KeyParseError(s.to_string()))
    }
}

impl TryFrom<String> for KeyId {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyId> for String {
    fn from(key: KeyId) -> Self {
        key.to_string()
    }
}
