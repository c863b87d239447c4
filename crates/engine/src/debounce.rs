//! Cancellable debounce timers.
//!
//! An explicit deadline map instead of scheduled closures: arming a key
//! that is already pending replaces its deadline, so there is at most one
//! pending invocation per key regardless of call frequency. The host
//! pumps the map through [`Coordinator::tick`]; what to do when a key
//! fires is encoded in the key itself.
//!
//! [`Coordinator::tick`]: crate::coordinator::Coordinator::tick

use std::collections::HashMap;
use std::time::{Duration, Instant};

use landform_core::calculation::Calculation;
use landform_core::FieldId;

/// What a pending timer will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKey {
    Recalculate(Calculation),
    Validate(FieldId),
}

/// Map from timer key to its pending deadline.
#[derive(Debug, Default)]
pub struct DebounceTimers {
    pending: HashMap<TimerKey, Instant>,
}

impl DebounceTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `key` to fire after `delay`, cancelling any pending
    /// deadline for the same key. Other keys are unaffected.
    pub fn arm(&mut self, key: TimerKey, now: Instant, delay: Duration) {
        self.pending.insert(key, now + delay);
    }

    /// Cancel one key. Returns whether it was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    /// Cancel everything pending.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every key whose deadline has passed, ordered by
    /// deadline (ties broken by key order, so firing is deterministic).
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut due: Vec<(Instant, TimerKey)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, *key))
            .collect();
        due.sort();
        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.pending.contains_key(&key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
