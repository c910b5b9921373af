use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use log::trace;

use crate::{KeyBindingTable, KeyId, LogicalAction};

/// Returned by the event callbacks to tell the event source whether to keep listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listening {
    Continue,
    Stop,
}

/// Which physical keys are held right now.
///
/// Written by the key-event source and read by the control loop from
/// another thread, so every access goes through the lock. A key that was
/// never seen reads as released.
///
/// Once the listener has seen the quit key go down the request is latched,
/// so a tap released between two polls still ends the session.
#[derive(Debug)]
pub struct KeyStateTracker {
    bindings: KeyBindingTable,
    pressed: RwLock<HashSet<KeyId>>,
    quit_requested: AtomicBool,
}

impl KeyStateTracker {
    pub fn new(bindings: KeyBindingTable) -> Self {
        Self {
            bindings,
            pressed: RwLock::new(HashSet::new()),
            quit_requested: AtomicBool::new(false),
        }
    }

    pub fn bindings(&self) -> &KeyBindingTable {
        &self.bindings
    }

    pub fn record_press(&self, key: KeyId) {
        self.write().insert(key);
    }

    pub fn record_release(&self, key: KeyId) {
        self.write().remove(&key);
    }

    pub fn is_pressed(&self, key: KeyId) -> bool {
        self.read().contains(&key)
    }

    pub fn is_action_pressed(&self, action: LogicalAction) -> bool {
        self.is_pressed(self.bindings.key(action))
    }

    /// True once the listener has seen the quit key pressed, or while it is held.
    pub fn should_terminate(&self) -> bool {
        self.quit_requested.load(Ordering::Acquire) || self.is_action_pressed(LogicalAction::Quit)
    }

    /// Key-down callback for the event source. `None` is a key outside the
    /// known vocabulary and is ignored.
    pub fn on_press(&self, key: Option<KeyId>) -> Listening {
        if let Some(key) = key {
            trace!("key down: {}", key);
            self.record_press(key);
        }
        if self.is_action_pressed(LogicalAction::Quit) {
            self.quit_requested.store(true, Ordering::Release);
        }
        if self.should_terminate() {
            Listening::Stop
        } else {
            Listening::Continue
        }
    }

    /// Key-up callback for the event source. Always keeps listening.
    pub fn on_release(&self, key: Option<KeyId>) -> Listening {
        if let Some(key) = key {
            trace!("key up: {}", key);
            self.record_release(key);
        }
        Listening::Continue
    }

    pub fn pressed_keys(&self) -> Vec<KeyId> {
        let mut keys: Vec<KeyId> = self.read().iter().copied().collect();
        keys.sort();
        keys
    }

    // A poisoned lock still guards a valid key set; keep using it.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<KeyId>> {
        self.pressed.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<KeyId>> {
        self.pressed.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for KeyStateTracker {
    fn default() -> Self {
        Self::new(KeyBindingTable::default())
    }
}
