//! Completion signals: single-fire handles that connect a suspended action
//! to the collaborator that will eventually finish it.

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use bevy::prelude::Event;
use serde::{Deserialize, Serialize};

use crate::prelude::ActorId;

/// The signal can still fire.
const ARMED: u8 = 0;
/// The signal fired.
const FIRED: u8 = 1;
/// The signal was disposed before firing. Any late firing is dropped.
const DISPOSED: u8 = 2;

/// Identifies which pending action a signal belongs to.
///
/// The ticket is unique per actor runner, so a completion that arrives after
/// the action was abandoned (or replaced by a later one) never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalTarget {
    /// The actor whose runner holds the pending action.
    pub actor: ActorId,
    /// The ticket of the pending action in that runner.
    pub ticket: u64,
}

/// Event sent when a completion signal fires.
/// The runner systems route it to the blocked action `resume`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ActionCompleted(pub SignalTarget);

/// A single-use completion handle.
///
/// Clones share the same state: whichever clone fires first wins and every
/// other firing, including one after [`CompletionSignal::dispose`], is a no-op.
///
/// Only the target is serialized. A deserialized signal starts armed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SignalTarget", into = "SignalTarget")]
pub struct CompletionSignal {
    /// Where the firing is routed.
    target: SignalTarget,
    /// One of `ARMED`, `FIRED` or `DISPOSED`.
    state: Arc<AtomicU8>,
}

impl CompletionSignal {
    /// Creates an armed signal for the given actor and ticket.
    pub fn new(actor: impl Into<ActorId>, ticket: u64) -> Self {
        SignalTarget {
            actor: actor.into(),
            ticket,
        }
        .into()
    }

    /// The target this signal routes to.
    pub fn target(&self) -> &SignalTarget {
        &self.target
    }

    /// Fires the signal. Returns the completion event to send if this is
    /// the first firing, `None` if it already fired or was disposed.
    pub fn fire(&self) -> Option<ActionCompleted> {
        self.state
            .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActionCompleted(self.target.clone()))
    }

    /// Disposes the signal so that a late firing is silently dropped.
    /// Has no effect on a signal that already fired.
    pub fn dispose(&self) {
        let _ = self
            .state
            .compare_exchange(ARMED, DISPOSED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Whether the signal can still fire.
    pub fn is_armed(&self) -> bool {
        self.state.load(Ordering::Acquire) == ARMED
    }

    /// Whether the signal already fired.
    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::Acquire) == FIRED
    }
}

impl From<SignalTarget> for CompletionSignal {
    fn from(target: SignalTarget) -> Self {
        Self {
            target,
            state: Arc::new(AtomicU8::new(ARMED)),
        }
    }
}

impl From<CompletionSignal> for SignalTarget {
    fn from(signal: CompletionSignal) -> Self {
        signal.target
    }
}
