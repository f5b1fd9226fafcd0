//! Per-instrument signal memory for duplicate-alert suppression.
//!
//! Edge-triggered: an alert fires when an instrument's signal changes to a
//! new non-NONE direction, and never while it stays the same. A NONE
//! observation resets the memory so the next signal fires again.
//!
//! State lives in a sharded concurrent map. Each observation is one atomic
//! read-modify-write on a single key, so scans of different instruments can
//! run in parallel without serialising on a global lock.

use crate::domain::SignalDirection;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Outcome of feeding one signal into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// New direction; the caller should alert. `previous` is what was stored.
    Fire {
        direction: SignalDirection,
        previous: Option<SignalDirection>,
    },
    /// Same direction as stored; suppress the alert.
    Duplicate(SignalDirection),
    /// NONE observed; any stored direction was forgotten.
    Cleared,
}

impl Transition {
    pub fn should_alert(&self) -> bool {
        matches!(self, Transition::Fire { .. })
    }
}

#[derive(Debug, Default)]
pub struct SignalStateTracker {
    last: DashMap<String, SignalDirection>,
}

impl SignalStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest signal for `symbol` and report what changed.
    pub fn observe(&self, symbol: &str, direction: Option<SignalDirection>) -> Transition {
        let Some(direction) = direction else {
            self.last.remove(symbol);
            return Transition::Cleared;
        };

        match self.last.entry(symbol.to_string()) {
            Entry::Occupied(mut stored) => {
                if *stored.get() == direction {
                    Transition::Duplicate(direction)
                } else {
                    let previous = stored.insert(direction);
                    Transition::Fire {
                        direction,
                        previous: Some(previous),
                    }
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(direction);
                Transition::Fire {
                    direction,
                    previous: None,
                }
            }
        }
    }

    /// Stored direction for `symbol`; `None` means NONE.
    pub fn last(&self, symbol: &str) -> Option<SignalDirection> {
        self.last.get(symbol).map(|d| *d)
    }

    /// Put back the state a `Fire` replaced, e.g. after a failed delivery.
    pub fn restore(&self, symbol: &str, previous: Option<SignalDirection>) {
        match previous {
            Some(direction) => {
                self.last.insert(symbol.to_string(), direction);
            }
            None => {
                self.last.remove(symbol);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub fn clear(&self) {
        self.last.clear();
    }

    /// Copy of the current state, sorted by symbol.
    pub fn snapshot(&self) -> Vec<(String, SignalDirection)> {
        let mut entries: Vec<(String, SignalDirection)> = self
            .last
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
