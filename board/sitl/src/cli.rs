use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use teleop::{interval_from_secs, ControlConfig, KeyBindingTable};

use crate::flight_axis::DEFAULT_FLIGHT_AXIS_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    Azerty,
    Qwerty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// Log commands instead of flying anything
    Log,
    /// Drive RealFlight through its FlightAxis link
    FlightAxis,
}

/// Keyboard teleoperation for the DucPilot SITL.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Built-in key layout, ignored when --bindings is given
    #[arg(long, value_enum, default_value = "azerty", env = "TELEOP_LAYOUT")]
    pub layout: Layout,

    /// JSON file mapping every action to a key name
    #[arg(long, env = "TELEOP_BINDINGS")]
    pub bindings: Option<PathBuf>,

    /// Control loop period in milliseconds
    #[arg(long, default_value_t = 50, env = "TELEOP_TICK_MS")]
    pub tick_ms: u64,

    /// Minimum seconds between two take-off commands while the key is held
    #[arg(long, default_value_t = 2.0, env = "TELEOP_TAKEOFF_INTERVAL")]
    pub takeoff_interval: f64,

    /// Minimum seconds between two landing commands while the key is held
    #[arg(long, default_value_t = 2.0, env = "TELEOP_LANDING_INTERVAL")]
    pub landing_interval: f64,

    #[arg(long, value_enum, default_value = "log", env = "TELEOP_SINK")]
    pub sink: SinkKind,

    #[arg(long, default_value = DEFAULT_FLIGHT_AXIS_URL, env = "TELEOP_FLIGHT_AXIS_URL")]
    pub flight_axis_url: String,
}

impl Args {
    pub fn key_bindings(&self) -> anyhow::Result<KeyBindingTable> {
        match &self.bindings {
            Some(path) => KeyBindingTable::load(path)
                .with_context(|| format!("Failed to load key bindings from {}", path.display())),
            None => Ok(match self.layout {
                Layout::Azerty => KeyBindingTable::azerty(),
                Layout::Qwerty => KeyBindingTable::qwerty(),
            }),
        }
    }

    pub fn control_config(&self) -> anyhow::Result<ControlConfig> {
        let config = ControlConfig::default()
            .with_tick_period(Duration::from_millis(self.tick_ms))
            .with_takeoff_interval(interval_from_secs("take-off", self.takeoff_interval)?)
            .with_landing_interval(interval_from_secs("landing", self.landing_interval)?);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use teleop::{KeyId, LogicalAction};

    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sitl"]).unwrap();
        assert_eq!(args.control_config().unwrap(), ControlConfig::default());
        assert_eq!(args.key_bindings().unwrap(), KeyBindingTable::azerty());
        assert_eq!(args.sink, SinkKind::Log);
    }

    #[test]
    fn test_qwerty_layout() {
        let args = Args::try_parse_from(["sitl", "--layout", "qwerty"]).unwrap();
        let table = args.key_bindings().unwrap();
        assert_eq!(table.key(LogicalAction::MoveForward), KeyId::Char('w'));
    }

    #[test]
    fn test_negative_interval_is_rejected() {
        let args = Args::try_parse_from(["sitl", "--takeoff-interval=-1"]).unwrap();
        assert!(args.control_config().is_err());
    }

    #[test]
    fn test_zero_tick_is_rejected() {
        let args = Args::try_parse_from(["sitl", "--tick-ms", "0"]).unwrap();
        assert!(args.control_config().is_err());
    }
}
