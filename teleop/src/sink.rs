use std::sync::{Arc, Mutex, PoisonError};

use log::info;

use crate::{error::SinkError, Directive, PilotingCommand, TickOutput};

/// Receives the commands produced by the control loop.
///
/// Within a tick the directive, if any, is delivered before the piloting
/// command. Implementations should not block for longer than a tick.
pub trait VehicleSink: Send {
    fn directive(&mut self, directive: Directive) -> Result<(), SinkError>;

    fn pilot(&mut self, command: &PilotingCommand) -> Result<(), SinkError>;
}

impl<S: VehicleSink + ?Sized> VehicleSink for Box<S> {
    fn directive(&mut self, directive: Directive) -> Result<(), SinkError> {
        (**self).directive(directive)
    }

    fn pilot(&mut self, command: &PilotingCommand) -> Result<(), SinkError> {
        (**self).pilot(command)
    }
}

/// Logs directives at `info` and motion at `debug`; useful without a vehicle attached.
#[derive(Debug, Default)]
pub struct LogSink {
    last: PilotingCommand,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VehicleSink for LogSink {
    fn directive(&mut self, directive: Directive) -> Result<(), SinkError> {
        info!("vehicle <- {}", directive);
        Ok(())
    }

    fn pilot(&mut self, command: &PilotingCommand) -> Result<(), SinkError> {
        if *command != self.last {
            info!("vehicle <- {}", command);
            self.last = *command;
        } else {
            log::trace!("vehicle <- {}", command);
        }
        Ok(())
    }
}

/// Keeps every delivered tick in a shared log. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<TickOutput>>>,
    pending: Option<Directive>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> Vec<TickOutput> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn directives(&self) -> Vec<Directive> {
        self.ticks().iter().filter_map(|tick| tick.directive).collect()
    }
}

impl VehicleSink for RecordingSink {
    fn directive(&mut self, directive: Directive) -> Result<(), SinkError> {
        self.pending = Some(directive);
        Ok(())
    }

    fn pilot(&mut self, command: &PilotingCommand) -> Result<(), SinkError> {
        let tick = TickOutput {
            directive: self.pending.take(),
            command: *command,
        };
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tick);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_pairs_directive_with_next_command() {
        let mut sink = RecordingSink::new();
        let observer = sink.clone();

        sink.directive(Directive::TakeOff).unwrap();
        sink.pilot(&PilotingCommand::neutral()).unwrap();
        sink.pilot(&PilotingCommand::neutral()).unwrap();

        let ticks = observer.ticks();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].directive, Some(Directive::TakeOff));
        assert_eq!(ticks[1].directive, None);
        assert_eq!(observer.directives(), vec![Directive::TakeOff]);
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let recorder = RecordingSink::new();
        let mut sink: Box<dyn VehicleSink> = Box::new(recorder.clone());
        sink.pilot(&PilotingCommand::neutral()).unwrap();
        assert_eq!(recorder.ticks().len(), 1);
    }
}
