use std::time::{Duration, Instant};

use crate::{KeyStateTracker, LogicalAction};

/// Gates one-shot actions so a held key fires at most once per interval.
///
/// Only elapsed time gates a re-fire: releasing and pressing the key again
/// inside the interval does not reset anything, and a key held past the
/// interval fires again.
#[derive(Debug, Default, Clone)]
pub struct RateLimiter {
    last_fired: [Option<Instant>; LogicalAction::COUNT],
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `action` at `now` if its key is held and at least `min_interval`
    /// has passed since the last firing. Records `now` only when it fires.
    ///
    /// A `now` earlier than the last firing (clock stepped back) never fires.
    pub fn try_fire(
        &mut self,
        keys: &KeyStateTracker,
        action: LogicalAction,
        min_interval: Duration,
        now: Instant,
    ) -> bool {
        let slot = &mut self.last_fired[action.index()];
        if let Some(last) = *slot {
            match now.checked_duration_since(last) {
                Some(elapsed) if elapsed >= min_interval => {}
                _ => return false,
            }
        }
        if !keys.is_action_pressed(action) {
            return false;
        }
        *slot = Some(now);
        true
    }

    pub fn last_fired(&self, action: LogicalAction) -> Option<Instant> {
        self.last_fired[action.index()]
    }
}
