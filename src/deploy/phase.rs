// ABOUTME: Work phases performed while the machine sits in a non-terminal state.
// ABOUTME: Maps lifecycle states to the external tooling step run in each.

use serde::Serialize;
use std::fmt;

use super::state::DeploymentState;

/// A unit of external work. Each phase runs while the machine is in its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ValidateParameters,
    Lint,
    Plan,
    Deploy,
    VerifyHealth,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::ValidateParameters,
        Phase::Lint,
        Phase::Plan,
        Phase::Deploy,
        Phase::VerifyHealth,
    ];

    /// The phase performed in `state`, if any.
    pub fn for_state(state: DeploymentState) -> Option<Phase> {
        match state {
            DeploymentState::ValidatingParameters => Some(Phase::ValidateParameters),
            DeploymentState::Linting => Some(Phase::Lint),
            DeploymentState::Planning => Some(Phase::Plan),
            DeploymentState::Deploying => Some(Phase::Deploy),
            DeploymentState::VerifyingHealth => Some(Phase::VerifyHealth),
            DeploymentState::Initialized
            | DeploymentState::Completed
            | DeploymentState::Failed => None,
        }
    }

    pub fn state(self) -> DeploymentState {
        match self {
            Phase::ValidateParameters => DeploymentState::ValidatingParameters,
            Phase::Lint => DeploymentState::Linting,
            Phase::Plan => DeploymentState::Planning,
            Phase::Deploy => DeploymentState::Deploying,
            Phase::VerifyHealth => DeploymentState::VerifyingHealth,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::ValidateParameters => "parameter validation",
            Phase::Lint => "lint",
            Phase::Plan => "planning",
            Phase::Deploy => "deployment",
            Phase::VerifyHealth => "health verification",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
