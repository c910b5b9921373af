use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};

use crate::{
    error::{ConfigError, SinkError},
    AxisResolver, AxisValues, ControlConfig, Directive, KeyStateTracker, LogicalAction,
    PilotingCommand, RateLimiter, TickOutput, VehicleSink,
};

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Emitted(TickOutput),
    /// The quit key was held at the top of the tick; nothing was sent.
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    QuitKey,
    Cancelled,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub ticks: u64,
    pub directives: u64,
    pub sink_errors: u64,
    pub exit: ExitReason,
}

/// Fixed-rate driver turning held keys into one vehicle command per tick.
///
/// The loop only reads the shared [`KeyStateTracker`]; the rate limiter
/// state is owned here. Constructing a loop sends nothing.
pub struct ControlLoop<S> {
    keys: Arc<KeyStateTracker>,
    limiter: RateLimiter,
    config: ControlConfig,
    sink: S,
    last_axes: AxisValues,
    ticks: u64,
    directives: u64,
    sink_errors: u64,
}

impl<S: VehicleSink> ControlLoop<S> {
    pub fn new(keys: Arc<KeyStateTracker>, sink: S, config: ControlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            keys,
            limiter: RateLimiter::new(),
            config,
            sink,
            last_axes: AxisValues::default(),
            ticks: 0,
            directives: 0,
            sink_errors: 0,
        })
    }

    /// Run one tick as of `now`.
    ///
    /// Take-off is checked before landing and at most one of them fires.
    /// A piloting command is always sent, neutral when no axis key is held.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.keys.should_terminate() {
            return TickOutcome::Terminated;
        }

        let directive = self.next_directive(now);
        let axes = AxisResolver::new(&self.keys).values();
        if axes != self.last_axes {
            debug!(
                "axes: roll={} pitch={} yaw={} throttle={}",
                axes.roll, axes.pitch, axes.yaw, axes.throttle
            );
            self.last_axes = axes;
        }
        let command = PilotingCommand::from_axes(axes);

        if let Some(directive) = directive {
            info!("sending {}", directive);
            self.directives += 1;
            let result = self.sink.directive(directive);
            self.note_sink_result(result);
        }
        let result = self.sink.pilot(&command);
        self.note_sink_result(result);
        self.ticks += 1;

        TickOutcome::Emitted(TickOutput { directive, command })
    }

    /// Tick every `tick_period` until the quit key is held or `cancel` turns true.
    ///
    /// Both stop conditions are checked only at tick boundaries.
    pub async fn run(mut self, cancel: watch::Receiver<bool>) -> SessionReport {
        info!(
            "control session started: tick {:?}, take-off interval {:?}, landing interval {:?}",
            self.config.tick_period, self.config.takeoff_interval, self.config.landing_interval
        );
        let mut ticker = interval(self.config.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            // the limiter runs on the same clock as the ticker
            let now = ticker.tick().await.into_std();
            if *cancel.borrow() {
                break ExitReason::Cancelled;
            }
            if let TickOutcome::Terminated = self.tick(now) {
                break ExitReason::QuitKey;
            }
        };

        let report = self.report(exit);
        info!(
            "control session ended ({:?}) after {} ticks, {} directives, {} sink errors",
            report.exit, report.ticks, report.directives, report.sink_errors
        );
        report
    }

    pub fn report(&self, exit: ExitReason) -> SessionReport {
        SessionReport {
            ticks: self.ticks,
            directives: self.directives,
            sink_errors: self.sink_errors,
            exit,
        }
    }

    fn next_directive(&mut self, now: Instant) -> Option<Directive> {
        [
            (LogicalAction::TakeOff, Directive::TakeOff),
            (LogicalAction::Landing, Directive::Landing),
        ]
        .into_iter()
        .find(|&(action, directive)| {
            let min_interval: Duration = self.config.interval_for(directive);
            self.limiter.try_fire(&self.keys, action, min_interval, now)
        })
        .map(|(_, directive)| directive)
    }

    fn note_sink_result(&mut self, result: Result<(), SinkError>) {
        if let Err(err) = result {
            self.sink_errors += 1;
            warn!("vehicle sink rejected command: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyId, Listening, PilotingMode, RecordingSink, SpecialKey};

    const TICK: Duration = Duration::from_millis(50);

    fn session() -> (Arc<KeyStateTracker>, ControlLoop<RecordingSink>, RecordingSink) {
        let keys = Arc::new(KeyStateTracker::default());
        let sink = RecordingSink::new();
        let control = ControlLoop::new(keys.clone(), sink.clone(), ControlConfig::default()).unwrap();
        (keys, control, sink)
    }

    struct FailingSink;

    impl VehicleSink for FailingSink {
        fn directive(&mut self, _directive: Directive) -> Result<(), SinkError> {
            Err(SinkError::Closed)
        }

        fn pilot(&mut self, _command: &PilotingCommand) -> Result<(), SinkError> {
            Err(SinkError::Transport("timeout".to_string()))
        }
    }

    #[test]
    fn test_construction_sends_nothing() {
        let (_keys, _control, sink) = session();
        assert!(sink.ticks().is_empty());
    }

    #[test]
    fn test_idle_ticks_emit_neutral_commands() {
        let (_keys, mut control, sink) = session();
        let t0 = Instant::now();
        for i in 0..3 {
            control.tick(t0 + TICK * i);
        }
        let ticks = sink.ticks();
        assert_eq!(ticks.len(), 3);
        for tick in ticks {
            assert_eq!(tick.directive, None);
            assert_eq!(tick.command, PilotingCommand::neutral());
        }
    }

    #[test]
    fn test_held_takeoff_fires_once_across_five_ticks() {
        let (keys, mut control, sink) = session();
        keys.record_press(KeyId::Char('t'));
        let t0 = Instant::now();
        for i in 0..5 {
            control.tick(t0 + TICK * i);
        }
        let ticks = sink.ticks();
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0].directive, Some(Directive::TakeOff));
        assert!(ticks[1..].iter().all(|tick| tick.directive.is_none()));
        assert_eq!(control.report(ExitReason::Cancelled).directives, 1);
    }

    #[test]
    fn test_held_takeoff_refires_after_interval() {
        let (keys, mut control, sink) = session();
        keys.record_press(KeyId::Char('t'));
        let t0 = Instant::now();
        control.tick(t0);
        control.tick(t0 + Duration::from_millis(1950));
        control.tick(t0 + Duration::from_millis(2000));
        assert_eq!(
            sink.ticks().iter().map(|tick| tick.directive).collect::<Vec<_>>(),
            vec![Some(Directive::TakeOff), None, Some(Directive::TakeOff)]
        );
    }

    #[test]
    fn test_takeoff_has_priority_over_landing() {
        let (keys, mut control, _sink) = session();
        keys.record_press(KeyId::Char('t'));
        keys.record_press(KeyId::Char('l'));
        let t0 = Instant::now();

        let first = control.tick(t0);
        assert!(matches!(
            first,
            TickOutcome::Emitted(TickOutput { directive: Some(Directive::TakeOff), .. })
        ));
        let second = control.tick(t0 + TICK);
        assert!(matches!(
            second,
            TickOutcome::Emitted(TickOutput { directive: Some(Directive::Landing), .. })
        ));
    }

    #[test]
    fn test_axis_keys_produce_active_command() {
        let (keys, mut control, _sink) = session();
        keys.record_press(KeyId::Char('z'));
        keys.record_press(SpecialKey::Left.into());
        match control.tick(Instant::now()) {
            TickOutcome::Emitted(output) => {
                assert_eq!(output.command.mode(), PilotingMode::Active);
                assert_eq!(output.command.pitch(), 100);
                assert_eq!(output.command.yaw(), -100);
                assert_eq!(output.command.roll(), 0);
                assert_eq!(output.command.throttle(), 0);
            }
            TickOutcome::Terminated => panic!("unexpected termination"),
        }
    }

    #[test]
    fn test_quit_stops_emission() {
        let (keys, mut control, sink) = session();
        let t0 = Instant::now();
        control.tick(t0);
        keys.record_press(SpecialKey::Esc.into());
        assert_eq!(control.tick(t0 + TICK), TickOutcome::Terminated);
        assert_eq!(sink.ticks().len(), 1);
    }

    #[test]
    fn test_quit_tap_between_ticks_terminates() {
        let (keys, mut control, sink) = session();
        let t0 = Instant::now();
        control.tick(t0);
        assert_eq!(keys.on_press(Some(SpecialKey::Esc.into())), Listening::Stop);
        assert_eq!(keys.on_release(Some(SpecialKey::Esc.into())), Listening::Continue);
        assert_eq!(control.tick(t0 + TICK), TickOutcome::Terminated);
        assert_eq!(sink.ticks().len(), 1);
    }

    #[test]
    fn test_sink_errors_are_counted_not_fatal() {
        let keys = Arc::new(KeyStateTracker::default());
        keys.record_press(KeyId::Char('t'));
        let mut control = ControlLoop::new(keys, FailingSink, ControlConfig::default()).unwrap();
        let t0 = Instant::now();
        control.tick(t0);
        control.tick(t0 + TICK);
        let report = control.report(ExitReason::Cancelled);
        assert_eq!(report.ticks, 2);
        assert_eq!(report.directives, 1);
        assert_eq!(report.sink_errors, 3);
    }

    #[test]
    fn test_zero_tick_period_is_rejected() {
        let keys = Arc::new(KeyStateTracker::default());
        let config = ControlConfig::default().with_tick_period(Duration::ZERO);
        assert!(matches!(
            ControlLoop::new(keys, RecordingSink::new(), config),
            Err(ConfigError::ZeroTickPeriod)
        ));
    }
}
