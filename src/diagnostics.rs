// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn region_substituted(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RegionSubstituted,
            message: message.into(),
        }
    }

    pub fn health_check_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::HealthCheckSkipped,
            message: message.into(),
        }
    }

    pub fn audit_write(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::AuditWrite,
            message: message.into(),
        }
    }

    pub fn phase(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Phase,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A requested region was replaced by the geography profile's choice.
    RegionSubstituted,
    /// Health verification was skipped on request.
    HealthCheckSkipped,
    /// Failed to append to the audit log.
    AuditWrite,
    /// A phase succeeded but reported warnings.
    Phase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::region_substituted("eastasia -> southeastasia"));
        diag.warn(Warning::audit_write("permission denied"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::region_substituted("x").kind,
            WarningKind::RegionSubstituted
        );
        assert_eq!(
            Warning::health_check_skipped("x").kind,
            WarningKind::HealthCheckSkipped
        );
        assert_eq!(Warning::audit_write("x").kind, WarningKind::AuditWrite);
        assert_eq!(Warning::phase("x").kind, WarningKind::Phase);
    }
}
