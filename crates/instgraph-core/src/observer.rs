//! Observation of committed state changes.
//!
//! Every elementary state assignment that actually changes a value emits one
//! [`StateChange`] to each registered [`StateObserver`], after the value is
//! stored. A single stimulus usually emits many events as the change ripples
//! through beams and links. Observers get a shared reference to the event and
//! no access to the graph, so they cannot steer propagation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::beam::BeamId;
use crate::put::PutId;
use crate::types::{BeamState, PutState};

/// One committed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum StateChange {
    /// A put changed state
    Put {
        put: PutId,
        from: PutState,
        to: PutState,
    },
    /// A beam changed state
    Beam {
        beam: BeamId,
        from: BeamState,
        to: BeamState,
    },
}

impl StateChange {
    /// The put that changed, if this is a put event.
    pub fn put(&self) -> Option<PutId> {
        match self {
            StateChange::Put { put, .. } => Some(*put),
            StateChange::Beam { .. } => None,
        }
    }

    /// The beam that changed, if this is a beam event.
    pub fn beam(&self) -> Option<BeamId> {
        match self {
            StateChange::Beam { beam, .. } => Some(*beam),
            StateChange::Put { .. } => None,
        }
    }
}

/// Receives every committed state change in a graph.
pub trait StateObserver {
    fn on_state_change(&mut self, change: &StateChange);
}

impl<F> StateObserver for F
where
    F: FnMut(&StateChange),
{
    fn on_state_change(&mut self, change: &StateChange) {
        self(change)
    }
}

/// An observer that records every change in order.
///
/// Cloning shares the underlying log, so one clone can be registered on the
/// graph while another is kept to read the events back.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    events: Rc<RefCell<Vec<StateChange>>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Copy of the recorded changes.
    pub fn events(&self) -> Vec<StateChange> {
        self.events.borrow().clone()
    }

    /// Take the recorded changes, leaving the log empty.
    pub fn drain(&self) -> Vec<StateChange> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl StateObserver for ChangeLog {
    fn on_state_change(&mut self, change: &StateChange) {
        self.events.borrow_mut().push(*change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_log_shares_events() {
        let log = ChangeLog::new();
        let mut registered = log.clone();
        registered.on_state_change(&StateChange::Put {
            put: PutId(3),
            from: PutState::Off,
            to: PutState::On,
        });
        assert_eq!(log.len(), 1);
        assert_eq!(log.events()[0].put(), Some(PutId(3)));
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn closures_observe() {
        let mut count = 0;
        {
            let mut obs = |_: &StateChange| count += 1;
            obs.on_state_change(&StateChange::Beam {
                beam: BeamId(0),
                from: BeamState::Off,
                to: BeamState::On,
            });
        }
        assert_eq!(count, 1);
    }
}
