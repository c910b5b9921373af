use crate::{KeyStateTracker, LogicalAction};

/// Magnitude reported for a fully deflected axis.
pub const AXIS_MAGNITUDE: i8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Roll,
    Pitch,
    Yaw,
    Throttle,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::Roll, Axis::Pitch, Axis::Yaw, Axis::Throttle];

    /// The opposing pair driving this axis, as `(negative, positive)`.
    pub const fn actions(self) -> (LogicalAction, LogicalAction) {
        match self {
            Axis::Roll => (LogicalAction::MoveLeft, LogicalAction::MoveRight),
            Axis::Pitch => (LogicalAction::MoveBackward, LogicalAction::MoveForward),
            Axis::Yaw => (LogicalAction::TurnLeft, LogicalAction::TurnRight),
            Axis::Throttle => (LogicalAction::MoveDown, LogicalAction::MoveUp),
        }
    }
}

/// The four axis values resolved in one pass.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisValues {
    pub roll: i8,
    pub pitch: i8,
    pub yaw: i8,
    pub throttle: i8,
}

impl AxisValues {
    pub fn is_active(&self) -> bool {
        self.roll != 0 || self.pitch != 0 || self.yaw != 0 || self.throttle != 0
    }
}

/// Reads opposing key pairs out of a [`KeyStateTracker`] and turns them into
/// signed axis values.
///
/// Each axis is one of -100, 0 or 100. Holding both keys of a pair cancels
/// out to 0.
#[derive(Debug, Clone, Copy)]
pub struct AxisResolver<'a> {
    keys: &'a KeyStateTracker,
}

impl<'a> AxisResolver<'a> {
    pub fn new(keys: &'a KeyStateTracker) -> Self {
        Self { keys }
    }

    pub fn resolve(&self, axis: Axis) -> i8 {
        let (negative, positive) = axis.actions();
        let held = |action| i8::from(self.keys.is_action_pressed(action));
        AXIS_MAGNITUDE * (held(positive) - held(negative))
    }

    pub fn roll(&self) -> i8 {
        self.resolve(Axis::Roll)
    }

    pub fn pitch(&self) -> i8 {
        self.resolve(Axis::Pitch)
    }

    pub fn yaw(&self) -> i8 {
        self.resolve(Axis::Yaw)
    }

    pub fn throttle(&self) -> i8 {
        self.resolve(Axis::Throttle)
    }

    pub fn values(&self) -> AxisValues {
        AxisValues {
            roll: self.roll(),
            pitch: self.pitch(),
            yaw: self.yaw(),
            throttle: self.throttle(),
        }
    }

    pub fn has_active_command(&self) -> bool {
        self.values().is_active()
    }
}
