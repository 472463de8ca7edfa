// ABOUTME: Runtime-checked deployment state machine with timestamped history.
// ABOUTME: Rejected transitions are reported as `false` and leave the machine untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::state::DeploymentState;

/// One recorded state, in the order it was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: DeploymentState,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Lifecycle tracker for a single deployment.
///
/// The history is append-only and seeded with `Initialized`, so
/// `history().len() == successful transitions + 1` always holds. There is no
/// way to set the state directly.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: DeploymentState,
    history: Vec<HistoryEntry>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    /// Create a machine whose `Initialized` entry carries `created_at`.
    pub fn started_at(created_at: DateTime<Utc>) -> Self {
        Self {
            current: DeploymentState::Initialized,
            history: vec![HistoryEntry {
                state: DeploymentState::Initialized,
                at: created_at,
                context: None,
            }],
        }
    }

    pub fn state(&self) -> DeploymentState {
        self.current
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Move to `target` if it is an edge from the current state.
    ///
    /// Returns `false` without mutating anything when the edge does not exist.
    pub fn transition_to(&mut self, target: DeploymentState) -> bool {
        self.transition_with_context(target, None)
    }

    /// Like [`transition_to`](Self::transition_to), recording a note with the entry.
    pub fn transition_with_context(
        &mut self,
        target: DeploymentState,
        context: Option<String>,
    ) -> bool {
        if !self.current.can_transition_to(target) {
            tracing::warn!(from = %self.current, to = %target, "rejected state transition");
            return false;
        }

        // Keep history ordered even if the wall clock steps backwards.
        let now = Utc::now().max(self.last_entry().at);
        tracing::debug!(from = %self.current, to = %target, "state transition");

        self.current = target;
        self.history.push(HistoryEntry {
            state: target,
            at: now,
            context,
        });
        true
    }

    /// Time since the first history entry.
    ///
    /// Once terminal, measured to the final entry so the value stops growing.
    pub fn duration(&self) -> Duration {
        let end = if self.is_terminal() {
            self.last_entry().at
        } else {
            Utc::now()
        };
        (end - self.history[0].at).to_std().unwrap_or_default()
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration().as_secs_f64()
    }

    fn last_entry(&self) -> &HistoryEntry {
        // Seeded at construction and never truncated.
        &self.history[self.history.len() - 1]
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn starts_initialized_with_one_entry() {
        let machine = StateMachine::new();
        assert_eq!(machine.state(), DeploymentState::Initialized);
        assert_eq!(machine.history().len(), 1);
        assert!(!machine.is_terminal());
    }

    #[test]
    fn rejected_transition_leaves_history_alone() {
        let mut machine = StateMachine::new();
        assert!(!machine.transition_to(DeploymentState::Deploying));
        assert_eq!(machine.state(), DeploymentState::Initialized);
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn context_is_recorded_on_the_entry() {
        let mut machine = StateMachine::new();
        assert!(
            machine.transition_with_context(DeploymentState::Failed, Some("cancelled".into()))
        );
        let last = machine.history().last().unwrap();
        assert_eq!(last.state, DeploymentState::Failed);
        assert_eq!(last.context.as_deref(), Some("cancelled"));
    }

    #[test]
    fn duration_is_measured_from_creation() {
        let created = Utc::now() - TimeDelta::seconds(30);
        let machine = StateMachine::started_at(created);
        assert!(machine.duration() >= Duration::from_secs(30));
    }

    #[test]
    fn duration_is_frozen_once_terminal() {
        let created = Utc::now() - TimeDelta::seconds(10);
        let mut machine = StateMachine::started_at(created);
        assert!(machine.transition_to(DeploymentState::Failed));

        let first = machine.duration();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(machine.duration(), first);
    }

    #[test]
    fn history_timestamps_never_decrease() {
        let future = Utc::now() + TimeDelta::seconds(60);
        let mut machine = StateMachine::started_at(future);
        assert!(machine.transition_to(DeploymentState::ValidatingParameters));
        assert!(machine.history()[1].at >= machine.history()[0].at);
    }
}
