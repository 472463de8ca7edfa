// ABOUTME: Orchestrator that walks a deployment through its lifecycle.
// ABOUTME: Runs each phase, retries environmental failures with backoff, fails fast otherwise.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::audit::AuditLog;
use super::cancel::CancelToken;
use super::error::DriverError;
use super::executor::{PhaseExecutor, PhaseFailure, PhaseReport};
use super::machine::{HistoryEntry, StateMachine};
use super::phase::Phase;
use super::shared::SharedStateMachine;
use super::state::DeploymentState;
use crate::config::DeployConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::failure::{FailureClassifier, FailureType, RetryPolicy};
use crate::region::{CapabilityProvider, RegionResolver, ResolvedRegions};

/// Marker recorded on the `FAILED` entry when an operator aborts.
pub const CANCELLED_CONTEXT: &str = "cancelled";

/// Summary of a deployment run.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub deployment: String,
    pub state: DeploymentState,
    pub history: Vec<HistoryEntry>,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub regions: Option<ResolvedRegions>,
    /// Attempts made per phase, including the successful one.
    pub attempts: BTreeMap<Phase, u32>,
    pub warnings: Vec<Warning>,
}

/// Drives one deployment's state machine.
///
/// Owns its state machine, classifier, and retry policy; nothing is shared
/// between deployments. Retry counters are scoped to the current phase.
pub struct Orchestrator<E, P> {
    config: DeployConfig,
    deployment: String,
    executor: E,
    resolver: RegionResolver<P>,
    classifier: FailureClassifier,
    policy: RetryPolicy,
    machine: SharedStateMachine,
    audit: Option<AuditLog>,
    audit_started: bool,
    diagnostics: Diagnostics,
    attempts: BTreeMap<Phase, u32>,
    regions: Option<ResolvedRegions>,
}

impl<E: PhaseExecutor, P: CapabilityProvider> Orchestrator<E, P> {
    pub fn new(config: DeployConfig, executor: E, resolver: RegionResolver<P>) -> Self {
        let deployment = config.deployment_name();
        Self {
            config,
            deployment,
            executor,
            resolver,
            classifier: FailureClassifier::new(),
            policy: RetryPolicy::default(),
            machine: SharedStateMachine::new(StateMachine::new()),
            audit: None,
            audit_started: false,
            diagnostics: Diagnostics::default(),
            attempts: BTreeMap::new(),
            regions: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_classifier(mut self, classifier: FailureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn deployment_name(&self) -> &str {
        &self.deployment
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Read handle for status observers.
    pub fn state_handle(&self) -> SharedStateMachine {
        self.machine.clone()
    }

    /// Drive the deployment to `COMPLETED` (or `FAILED`).
    pub async fn run(&mut self, cancel: &CancelToken) -> Result<DeploymentReport, DriverError> {
        self.drive(DeploymentState::Completed, cancel).await
    }

    /// Dry run: validate, lint, and plan, stopping in `PLANNING`.
    ///
    /// A later [`run`](Self::run) continues from where the plan stopped.
    pub async fn plan(&mut self, cancel: &CancelToken) -> Result<DeploymentReport, DriverError> {
        self.drive(DeploymentState::Planning, cancel).await
    }

    pub fn report(&self) -> DeploymentReport {
        let snapshot = self.machine.snapshot();
        DeploymentReport {
            deployment: self.deployment.clone(),
            state: snapshot.state,
            history: snapshot.history,
            duration: snapshot.duration,
            regions: self.regions.clone(),
            attempts: self.attempts.clone(),
            warnings: self.diagnostics.warnings().to_vec(),
        }
    }

    async fn drive(
        &mut self,
        stop_at: DeploymentState,
        cancel: &CancelToken,
    ) -> Result<DeploymentReport, DriverError> {
        let current = self.machine.state();
        if current == DeploymentState::Failed {
            return Err(DriverError::InvalidTransition {
                from: current,
                to: stop_at,
            });
        }

        if !self.audit_started {
            self.audit_started = true;
            self.record_audit();
        }

        // Declaration order of DeploymentState follows the happy path.
        while self.machine.state() < stop_at {
            let current = self.machine.state();
            let Some(next) = current.next() else {
                break;
            };

            if cancel.is_cancelled() {
                return Err(self.cancel(current));
            }

            self.transition(next, None)?;
            if let Some(phase) = Phase::for_state(next) {
                self.run_phase(phase, cancel).await?;
            }
        }

        tracing::info!(
            deployment = %self.deployment,
            state = %self.machine.state(),
            "deployment stopped"
        );
        Ok(self.report())
    }

    async fn run_phase(&mut self, phase: Phase, cancel: &CancelToken) -> Result<(), DriverError> {
        if phase == Phase::Plan {
            self.resolve_regions(cancel).await?;
        }

        if phase == Phase::VerifyHealth && self.config.skip_health {
            self.diagnostics.warn(Warning::health_check_skipped(
                "health verification skipped (--skip-health)",
            ));
            return Ok(());
        }

        let mut attempt = 0u32;
        loop {
            tracing::debug!(%phase, attempt, "running phase");
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.execute(phase) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                return Err(self.cancel(phase.state()));
            };

            self.attempts.insert(phase, attempt + 1);
            let failure = match outcome.and_then(|report| self.gate(phase, report)) {
                Ok(report) => {
                    self.record_phase_warnings(phase, report);
                    return Ok(());
                }
                Err(failure) => failure,
            };

            let failure_type = failure
                .category()
                .unwrap_or_else(|| self.classifier.classify(failure.message()));
            let decision = self.policy.retry_strategy(failure_type, attempt);

            if !decision.should_retry {
                return Err(self.fail(phase, failure_type, attempt + 1, failure));
            }

            tracing::info!(
                %phase,
                %failure_type,
                attempt = attempt + 1,
                delay_secs = decision.delay_seconds(),
                error = failure.message(),
                "phase failed, retrying after backoff"
            );

            let slept = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = tokio::time::sleep(decision.delay) => true,
            };
            if !slept {
                return Err(self.cancel(phase.state()));
            }

            attempt += 1;
        }
    }

    async fn execute(&self, phase: Phase) -> Result<PhaseReport, PhaseFailure> {
        match phase {
            Phase::ValidateParameters => self.executor.validate_parameters(&self.config).await,
            Phase::Lint => self.executor.lint(&self.config).await,
            Phase::Plan => self.executor.plan(&self.config).await,
            Phase::Deploy => self.executor.deploy(&self.config).await,
            Phase::VerifyHealth => self.executor.verify_health(&self.config).await,
        }
    }

    /// Reject phase results that succeeded at the tool level but must not proceed.
    fn gate(&self, phase: Phase, report: PhaseReport) -> Result<PhaseReport, PhaseFailure> {
        match phase {
            Phase::Lint if !report.warnings.is_empty() && !self.config.allow_warnings => {
                Err(PhaseFailure::categorized(
                    format!(
                        "lint reported {} warning(s) (use --allow-warnings to accept): {}",
                        report.warnings.len(),
                        report.warnings.join("; ")
                    ),
                    FailureType::Logic,
                ))
            }
            Phase::Plan if !report.deletions.is_empty() && self.config.confirm_deletes => {
                Err(PhaseFailure::categorized(
                    format!(
                        "plan would delete {} resource(s) (use --no-confirm-deletes to accept): {}",
                        report.deletions.len(),
                        report.deletions.join(", ")
                    ),
                    FailureType::Logic,
                ))
            }
            _ => Ok(report),
        }
    }

    fn record_phase_warnings(&mut self, phase: Phase, report: PhaseReport) {
        for warning in report.warnings {
            self.diagnostics
                .warn(Warning::phase(format!("{phase}: {warning}")));
        }
        for deletion in report.deletions {
            self.diagnostics
                .warn(Warning::phase(format!("{phase}: will delete {deletion}")));
        }
    }

    async fn resolve_regions(&mut self, cancel: &CancelToken) -> Result<(), DriverError> {
        if self.regions.is_some() {
            return Ok(());
        }

        let request = self.config.region_request();
        let resolved = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            resolved = self.resolver.resolve_deployment_regions(&request) => Some(resolved),
        };
        let Some(resolved) = resolved else {
            return Err(self.cancel(DeploymentState::Planning));
        };

        match resolved {
            Ok(resolved) => {
                for sub in &resolved.substitutions {
                    self.diagnostics.warn(Warning::region_substituted(format!(
                        "{} region {} does not confirm {}; using {}",
                        sub.role,
                        sub.requested,
                        sub.missing.join(", "),
                        sub.chosen
                    )));
                }
                tracing::info!(primary = %resolved.primary, ml = %resolved.ml, "regions confirmed");
                self.config.location = resolved.primary.clone();
                // The template only receives an ML region when one was asked for.
                if self.config.location_ml.is_some() || !self.config.ml_services.is_empty() {
                    self.config.location_ml = Some(resolved.ml.clone());
                }
                self.regions = Some(resolved);
                Ok(())
            }
            Err(source) => {
                self.mark_failed(Some(source.to_string()));
                Err(DriverError::RegionUnavailable { source })
            }
        }
    }

    fn fail(
        &mut self,
        phase: Phase,
        failure_type: FailureType,
        attempts: u32,
        failure: PhaseFailure,
    ) -> DriverError {
        tracing::error!(%phase, %failure_type, attempts, error = failure.message(), "phase failed");
        self.mark_failed(Some(format!("{failure_type}: {}", failure.message())));
        DriverError::PhaseFailed {
            phase,
            failure_type,
            attempts,
            message: failure.message().to_string(),
        }
    }

    fn cancel(&mut self, state: DeploymentState) -> DriverError {
        tracing::warn!(deployment = %self.deployment, %state, "deployment cancelled");
        self.mark_failed(Some(CANCELLED_CONTEXT.to_string()));
        DriverError::Cancelled { state }
    }

    fn mark_failed(&mut self, context: Option<String>) {
        if let Err(e) = self.transition(DeploymentState::Failed, context) {
            tracing::error!(error = %e, "could not record failure");
        }
    }

    fn transition(
        &mut self,
        target: DeploymentState,
        context: Option<String>,
    ) -> Result<(), DriverError> {
        let from = self.machine.state();
        if !self.machine.transition_with_context(target, context) {
            return Err(DriverError::InvalidTransition { from, to: target });
        }
        self.record_audit();
        Ok(())
    }

    fn record_audit(&mut self) {
        let Some(log) = &self.audit else {
            return;
        };
        let Some(entry) = self.machine.last_entry() else {
            return;
        };
        if let Err(e) = log.append(&self.deployment, &entry) {
            self.diagnostics.warn(Warning::audit_write(format!(
                "failed to append to audit log {}: {e}",
                log.path().display()
            )));
        }
    }
}
