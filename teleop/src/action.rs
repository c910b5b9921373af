use std::fmt;

use serde::{Deserialize, Serialize};

/// Every control the operator can issue from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalAction {
    Quit,
    TakeOff,
    Landing,
    MoveLeft,
    MoveRight,
    MoveForward,
    MoveBackward,
    MoveUp,
    MoveDown,
    TurnLeft,
    TurnRight,
}

impl LogicalAction {
    pub const COUNT: usize = 11;

    pub const ALL: [LogicalAction; Self::COUNT] = [
        LogicalAction::Quit,
        LogicalAction::TakeOff,
        LogicalAction::Landing,
        LogicalAction::MoveLeft,
        LogicalAction::MoveRight,
        LogicalAction::MoveForward,
        LogicalAction::MoveBackward,
        LogicalAction::MoveUp,
        LogicalAction::MoveDown,
        LogicalAction::TurnLeft,
        LogicalAction::TurnRight,
    ];

    /// Position of the action in [`LogicalAction::ALL`], used to index fixed tables.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            LogicalAction::Quit => "quit",
            LogicalAction::TakeOff => "take_off",
            LogicalAction::Landing => "landing",
            LogicalAction::MoveLeft => "move_left",
            LogicalAction::MoveRight => "move_right",
            LogicalAction::MoveForward => "move_forward",
            LogicalAction::MoveBackward => "move_backward",
            LogicalAction::MoveUp => "move_up",
            LogicalAction::MoveDown => "move_down",
            LogicalAction::TurnLeft => "turn_left",
            LogicalAction::TurnRight => "turn_right",
        }
    }
}

impl fmt::Display for LogicalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
