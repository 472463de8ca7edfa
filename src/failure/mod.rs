// ABOUTME: Failure taxonomy for deployment phase errors.
// ABOUTME: Classifies raw tool output and decides whether and when to retry.

mod classifier;
mod retry;

pub use classifier::{ClassificationRule, FailureClassifier};
pub use retry::{RetryDecision, RetryPolicy};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a phase failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// Defect in the deployment's own inputs: syntax, schema, parameters.
    Logic,
    /// Transient infrastructure condition: timeouts, throttling, quota, network.
    Environmental,
    /// Text that matched no rule.
    Unknown,
}

impl FailureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureType::Logic => "logic",
            FailureType::Environmental => "environmental",
            FailureType::Unknown => "unknown",
        }
    }

    /// Operator-facing hint for what to do next.
    pub fn recommendation(self) -> &'static str {
        match self {
            FailureType::Logic => {
                "Fix the template or parameters and re-run; retrying unchanged inputs will not help"
            }
            FailureType::Environmental => {
                "Transient Azure condition persisted through all retries; check service health and quotas, then re-run"
            }
            FailureType::Unknown => {
                "Unrecognized failure; inspect the error output (try `cumulo troubleshoot`) before re-running"
            }
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
