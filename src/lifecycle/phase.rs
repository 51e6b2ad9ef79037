//! Server lifecycle phases.

use std::sync::Arc;

use tokio::sync::watch;

/// `Unstarted → Listening → Stopped`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Listening,
    Stopped,
}

/// Publishes the phase of one server to any number of observers.
#[derive(Clone, Debug)]
pub struct PhaseTracker {
    tx: Arc<watch::Sender<Phase>>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Unstarted);
        Self { tx: Arc::new(tx) }
    }

    /// Move to `next`. Transitions out of `Stopped` are ignored.
    pub fn set(&self, next: Phase) {
        self.tx.send_if_modified(|current| {
            if *current == Phase::Stopped || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    pub fn current(&self) -> Phase {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
