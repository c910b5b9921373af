use std::time::Duration;

use crate::{error::ConfigError, Directive};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(50);
pub const DEFAULT_ONE_SHOT_INTERVAL: Duration = Duration::from_secs(2);

/// Timing for a control session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConfig {
    /// Period between ticks; one command is emitted per tick.
    pub tick_period: Duration,
    pub takeoff_interval: Duration,
    pub landing_interval: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            takeoff_interval: DEFAULT_ONE_SHOT_INTERVAL,
            landing_interval: DEFAULT_ONE_SHOT_INTERVAL,
        }
    }
}

impl ControlConfig {
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn with_takeoff_interval(mut self, interval: Duration) -> Self {
        self.takeoff_interval = interval;
        self
    }

    pub fn with_landing_interval(mut self, interval: Duration) -> Self {
        self.landing_interval = interval;
        self
    }

    pub fn interval_for(&self, directive: Directive) -> Duration {
        match directive {
            Directive::TakeOff => self.takeoff_interval,
            Directive::Landing => self.landing_interval,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(())
    }
}

/// Convert a user-supplied number of seconds into an interval.
pub fn interval_from_secs(name: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidInterval { name, value: secs })
}
