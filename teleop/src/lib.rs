//! Keyboard teleoperation core: turns asynchronous key press/release events
//! into one piloting command per fixed tick, with rate-limited take-off and
//! landing.
mod action;
mod axis;
mod bindings;
mod command;
mod config;
mod control;
pub mod error;
mod key;
mod keys;
mod rate_limit;
mod sink;

pub use action::LogicalAction;
pub use axis::{Axis, AxisResolver, AxisValues, AXIS_MAGNITUDE};
pub use bindings::KeyBindingTable;
pub use command::{Directive, PilotingCommand, PilotingMode, TickOutput};
pub use config::{interval_from_secs, ControlConfig, DEFAULT_ONE_SHOT_INTERVAL, DEFAULT_TICK_PERIOD};
pub use control::{ControlLoop, ExitReason, SessionReport, TickOutcome};
pub use key::{KeyId, SpecialKey};
pub use keys::{KeyStateTracker, Listening};
pub use rate_limit::RateLimiter;
pub use sink::{LogSink, RecordingSink, VehicleSink};
