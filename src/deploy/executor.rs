// ABOUTME: Seam between the orchestrator and the tooling that does the work.
// ABOUTME: Implementations run lint, validate, what-if, apply, and health checks.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::DeployConfig;
use crate::failure::FailureType;

/// Outcome of a successful phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    /// Non-fatal findings (lint warnings, deprecations).
    pub warnings: Vec<String>,
    /// Resources the plan would delete.
    pub deletions: Vec<String>,
}

impl PhaseReport {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_deletions(mut self, deletions: Vec<String>) -> Self {
        self.deletions = deletions;
        self
    }
}

/// A failed attempt at a phase, carrying the raw tool output.
///
/// Failures without a category are classified from their text; a category is
/// only set when the orchestrator itself rejects a phase result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PhaseFailure {
    message: String,
    category: Option<FailureType>,
}

impl PhaseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: None,
        }
    }

    pub fn categorized(message: impl Into<String>, category: FailureType) -> Self {
        Self {
            message: message.into(),
            category: Some(category),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> Option<FailureType> {
        self.category
    }
}

/// External tooling driven by the orchestrator, one method per phase.
#[async_trait]
pub trait PhaseExecutor: Send + Sync {
    /// Check template and parameter inputs before any remote call.
    async fn validate_parameters(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure>;

    /// Lint the template.
    async fn lint(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure>;

    /// Validate and preview changes without applying them.
    async fn plan(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure>;

    /// Apply the template.
    async fn deploy(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure>;

    /// Check the deployed resources are healthy.
    async fn verify_health(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure>;
}

#[async_trait]
impl<T: PhaseExecutor + ?Sized> PhaseExecutor for Arc<T> {
    async fn validate_parameters(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        (**self).validate_parameters(config).await
    }

    async fn lint(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        (**self).lint(config).await
    }

    async fn plan(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        (**self).plan(config).await
    }

    async fn deploy(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        (**self).deploy(config).await
    }

    async fn verify_health(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        (**self).verify_health(config).await
    }
}
