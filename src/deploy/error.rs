// ABOUTME: Orchestration outcome errors with SNAFU pattern.
// ABOUTME: Carries the phase, failure category, and attempt count for operator output.

use snafu::Snafu;

use super::phase::Phase;
use super::state::DeploymentState;
use crate::failure::FailureType;
use crate::region::RegionUnavailable;

/// Why a deployment ended in `FAILED` (or could not proceed).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DriverError {
    #[snafu(display(
        "{phase} failed after {attempts} attempt(s) [{failure_type}]: {message}\n{}",
        failure_type.recommendation()
    ))]
    PhaseFailed {
        phase: Phase,
        failure_type: FailureType,
        attempts: u32,
        message: String,
    },

    #[snafu(display("deployment cancelled while {state}"))]
    Cancelled { state: DeploymentState },

    #[snafu(display("region check failed during planning: {source}"))]
    RegionUnavailable { source: RegionUnavailable },

    #[snafu(display("state machine rejected transition from {from} to {to}"))]
    InvalidTransition {
        from: DeploymentState,
        to: DeploymentState,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    LogicFailure,
    EnvironmentalFailure,
    UnknownFailure,
    Cancelled,
    RegionUnavailable,
    InvalidTransition,
}

impl DriverError {
    pub fn kind(&self) -> DriverErrorKind {
        match self {
            DriverError::PhaseFailed { failure_type, .. } => match failure_type {
                FailureType::Logic => DriverErrorKind::LogicFailure,
                FailureType::Environmental => DriverErrorKind::EnvironmentalFailure,
                FailureType::Unknown => DriverErrorKind::UnknownFailure,
            },
            DriverError::Cancelled { .. } => DriverErrorKind::Cancelled,
            DriverError::RegionUnavailable { .. } => DriverErrorKind::RegionUnavailable,
            DriverError::InvalidTransition { .. } => DriverErrorKind::InvalidTransition,
        }
    }

    /// Number of attempts made at the failing phase, if a phase failed.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            DriverError::PhaseFailed { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_failure_message_includes_recommendation() {
        let err = DriverError::PhaseFailed {
            phase: Phase::Lint,
            failure_type: FailureType::Logic,
            attempts: 1,
            message: "BCP018: Expected the \"}\" character".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("lint failed after 1 attempt(s) [logic]"));
        assert!(text.contains("BCP018"));
        assert!(text.contains(FailureType::Logic.recommendation()));
        assert_eq!(err.kind(), DriverErrorKind::LogicFailure);
        assert_eq!(err.attempts(), Some(1));
    }

    #[test]
    fn cancelled_kind() {
        let err = DriverError::Cancelled {
            state: DeploymentState::Deploying,
        };
        assert_eq!(err.kind(), DriverErrorKind::Cancelled);
        assert_eq!(err.to_string(), "deployment cancelled while DEPLOYING");
        assert_eq!(err.attempts(), None);
    }
}
