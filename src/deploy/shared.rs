// ABOUTME: Shared handle to a deployment state machine for concurrent observers.
// ABOUTME: One writer drives transitions; status readers take consistent snapshots.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use super::machine::{HistoryEntry, StateMachine};
use super::state::DeploymentState;

/// Point-in-time copy of a machine's state and history.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: DeploymentState,
    pub history: Vec<HistoryEntry>,
    pub duration: Duration,
}

/// Cloneable handle around a single [`StateMachine`].
///
/// Transitions take the write lock, so the compare-and-append in
/// `transition_to` is atomic. Readers always see a prefix of the history that
/// the writer produced, possibly one step behind an in-flight transition.
#[derive(Debug, Clone, Default)]
pub struct SharedStateMachine {
    inner: Arc<RwLock<StateMachine>>,
}

impl SharedStateMachine {
    pub fn new(machine: StateMachine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(machine)),
        }
    }

    pub fn transition_to(&self, target: DeploymentState) -> bool {
        self.inner.write().transition_to(target)
    }

    pub fn transition_with_context(&self, target: DeploymentState, context: Option<String>) -> bool {
        self.inner.write().transition_with_context(target, context)
    }

    pub fn state(&self) -> DeploymentState {
        self.inner.read().state()
    }

    pub fn is_terminal(&self) -> bool {
        self.inner.read().is_terminal()
    }

    /// Most recent history entry.
    pub fn last_entry(&self) -> Option<HistoryEntry> {
        self.inner.read().history().last().cloned()
    }

    pub fn snapshot(&self) -> Snapshot {
        let machine = self.inner.read();
        Snapshot {
            state: machine.state(),
            history: machine.history().to_vec(),
            duration: machine.duration(),
        }
    }
}
