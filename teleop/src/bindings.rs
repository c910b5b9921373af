use std::{collections::HashMap, fs, path::Path};

use crate::{error::BindingError, KeyId, LogicalAction, SpecialKey};

/// Total mapping from every [`LogicalAction`] to the physical key that triggers it.
///
/// The table is fixed once built. Construction fails if any action is left
/// unbound or if two actions would share a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindingTable {
    keys: [KeyId; LogicalAction::COUNT],
}

impl KeyBindingTable {
    /// Build from an optional custom layout, falling back to [`KeyBindingTable::azerty`].
    pub fn new(custom: Option<HashMap<LogicalAction, KeyId>>) -> Result<Self, BindingError> {
        match custom {
            Some(map) => Self::from_map(&map),
            None => Ok(Self::default()),
        }
    }

    pub fn from_map(map: &HashMap<LogicalAction, KeyId>) -> Result<Self, BindingError> {
        let mut keys = [KeyId::Special(SpecialKey::Esc); LogicalAction::COUNT];
        for action in LogicalAction::ALL {
            let key = map.get(&action).ok_or(BindingError::Missing(action))?;
            keys[action.index()] = key.normalized();
        }
        let table = Self { keys };
        table.check_conflicts()?;
        Ok(table)
    }

    /// Parse a JSON object of `action -> key` names, e.g. `{"take_off": "t", "quit": "esc"}`.
    pub fn from_json(text: &str) -> Result<Self, BindingError> {
        let map: HashMap<LogicalAction, KeyId> = serde_json::from_str(text)?;
        Self::from_map(&map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BindingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// French keyboard layout: ZQSD for translation, arrows for altitude and heading.
    pub fn azerty() -> Self {
        Self::layout('z', 'q', 's', 'd')
    }

    pub fn qwerty() -> Self {
        Self::layout('w', 'a', 's', 'd')
    }

    fn layout(forward: char, left: char, backward: char, right: char) -> Self {
        let mut keys = [KeyId::Special(SpecialKey::Esc); LogicalAction::COUNT];
        let mut bind = |action: LogicalAction, key: KeyId| keys[action.index()] = key;
        bind(LogicalAction::Quit, SpecialKey::Esc.into());
        bind(LogicalAction::TakeOff, KeyId::Char('t'));
        bind(LogicalAction::Landing, KeyId::Char('l'));
        bind(LogicalAction::MoveLeft, KeyId::Char(left));
        bind(LogicalAction::MoveRight, KeyId::Char(right));
        bind(LogicalAction::MoveForward, KeyId::Char(forward));
        bind(LogicalAction::MoveBackward, KeyId::Char(backward));
        bind(LogicalAction::MoveUp, SpecialKey::Up.into());
        bind(LogicalAction::MoveDown, SpecialKey::Down.into());
        bind(LogicalAction::TurnLeft, SpecialKey::Left.into());
        bind(LogicalAction::TurnRight, SpecialKey::Right.into());
        Self { keys }
    }

    pub fn key(&self, action: LogicalAction) -> KeyId {
        self.keys[action.index()]
    }

    /// Reverse lookup; `None` for keys that drive no action.
    pub fn action_for(&self, key: KeyId) -> Option<LogicalAction> {
        LogicalAction::ALL
            .into_iter()
            .find(|action| self.keys[action.index()] == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalAction, KeyId)> + '_ {
        LogicalAction::ALL
            .into_iter()
            .map(move |action| (action, self.keys[action.index()]))
    }

    fn check_conflicts(&self) -> Result<(), BindingError> {
        for (i, first) in LogicalAction::ALL.iter().enumerate() {
            for second in &LogicalAction::ALL[i + 1..] {
                let key = self.keys[first.index()];
                if key == self.keys[second.index()] {
                    return Err(BindingError::Conflict {
                        key,
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for KeyBindingTable {
    fn default() -> Self {
        Self::azerty()
    }
}
