// ABOUTME: Deployment lifecycle states and the directed transition graph.
// ABOUTME: A single happy path plus a failure edge from every non-terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A stage in the deployment lifecycle.
///
/// The happy path is
/// `Initialized → ValidatingParameters → Linting → Planning → Deploying → VerifyingHealth → Completed`.
/// Every non-terminal state may also move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentState {
    Initialized,
    ValidatingParameters,
    Linting,
    Planning,
    Deploying,
    VerifyingHealth,
    Completed,
    Failed,
}

impl DeploymentState {
    pub const ALL: [DeploymentState; 8] = [
        DeploymentState::Initialized,
        DeploymentState::ValidatingParameters,
        DeploymentState::Linting,
        DeploymentState::Planning,
        DeploymentState::Deploying,
        DeploymentState::VerifyingHealth,
        DeploymentState::Completed,
        DeploymentState::Failed,
    ];

    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentState::Completed | DeploymentState::Failed)
    }

    /// Successor on the happy path, if any.
    pub fn next(self) -> Option<DeploymentState> {
        match self {
            DeploymentState::Initialized => Some(DeploymentState::ValidatingParameters),
            DeploymentState::ValidatingParameters => Some(DeploymentState::Linting),
            DeploymentState::Linting => Some(DeploymentState::Planning),
            DeploymentState::Planning => Some(DeploymentState::Deploying),
            DeploymentState::Deploying => Some(DeploymentState::VerifyingHealth),
            DeploymentState::VerifyingHealth => Some(DeploymentState::Completed),
            DeploymentState::Completed | DeploymentState::Failed => None,
        }
    }

    /// Whether `(self, target)` is an edge of the transition graph.
    pub fn can_transition_to(self, target: DeploymentState) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == DeploymentState::Failed || self.next() == Some(target)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentState::Initialized => "INITIALIZED",
            DeploymentState::ValidatingParameters => "VALIDATING_PARAMETERS",
            DeploymentState::Linting => "LINTING",
            DeploymentState::Planning => "PLANNING",
            DeploymentState::Deploying => "DEPLOYING",
            DeploymentState::VerifyingHealth => "VERIFYING_HEALTH",
            DeploymentState::Completed => "COMPLETED",
            DeploymentState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown deployment state: {0}")]
pub struct ParseStateError(String);

impl FromStr for DeploymentState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeploymentState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStateError(s.to_string()))
    }
}
