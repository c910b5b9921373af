use std::fmt;

use crate::AxisValues;

/// Irreversible one-shot vehicle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    TakeOff,
    Landing,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::TakeOff => f.write_str("take-off"),
            Directive::Landing => f.write_str("landing"),
        }
    }
}

/// Whether the vehicle should apply the axis values or hold still.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotingMode {
    Neutral,
    Active,
}

/// The motion command sent every tick. Axes are always within -100..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PilotingCommand {
    mode: PilotingMode,
    axes: AxisValues,
}

impl PilotingCommand {
    /// All axes zero: explicitly cancels any earlier motion.
    pub const fn neutral() -> Self {
        Self {
            mode: PilotingMode::Neutral,
            axes: AxisValues {
                roll: 0,
                pitch: 0,
                yaw: 0,
                throttle: 0,
            },
        }
    }

    /// Active command carrying `axes`, or neutral when every axis is zero.
    pub fn from_axes(axes: AxisValues) -> Self {
        if axes.is_active() {
            Self {
                mode: PilotingMode::Active,
                axes,
            }
        } else {
            Self::neutral()
        }
    }

    pub fn mode(&self) -> PilotingMode {
        self.mode
    }

    pub fn is_neutral(&self) -> bool {
        self.mode == PilotingMode::Neutral
    }

    /// Wire flag: 1 for active piloting, 0 for neutral.
    pub fn flag(&self) -> u8 {
        match self.mode {
            PilotingMode::Neutral => 0,
            PilotingMode::Active => 1,
        }
    }

    pub fn axes(&self) -> AxisValues {
        self.axes
    }

    pub fn roll(&self) -> i8 {
        self.axes.roll
    }

    pub fn pitch(&self) -> i8 {
        self.axes.pitch
    }

    pub fn yaw(&self) -> i8 {
        self.axes.yaw
    }

    pub fn throttle(&self) -> i8 {
        self.axes.throttle
    }
}

impl Default for PilotingCommand {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Display for PilotingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PCMD({}, roll={}, pitch={}, yaw={}, throttle={})",
            self.flag(),
            self.roll(),
            self.pitch(),
            self.yaw(),
            self.throttle()
        )
    }
}

/// Everything emitted during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutput {
    pub directive: Option<Directive>,
    pub command: PilotingCommand,
}
