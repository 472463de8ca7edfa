// ABOUTME: Deploy and plan command implementation.
// ABOUTME: Builds the deployment config and drives the orchestrator through az.

use crate::cli::DeployArgs;
use cumulo::azure::{AzCli, AzExecutor};
use cumulo::config::{DeployConfig, ProjectConfig, resolve_subscription};
use cumulo::deploy::{AuditLog, CancelToken, DeploymentReport, Orchestrator};
use cumulo::error::{Error, Result};
use cumulo::output::Output;
use cumulo::region::RegionResolver;
use std::env;

/// How far to drive the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stop after the what-if preview.
    Plan,
    /// Run through health verification.
    Deploy,
}

pub async fn deploy(
    args: DeployArgs,
    mode: Mode,
    cancel: &CancelToken,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let cwd = env::current_dir()?;
    let project = ProjectConfig::discover(&cwd)?.unwrap_or_default();
    let config = build_config(args, &project)?;

    let az = AzCli::new().with_subscription(config.subscription_id.clone());
    let resolver = RegionResolver::new(az.clone()).with_profiles(project.geography_profiles());
    let mut orchestrator = Orchestrator::new(config, AzExecutor::new(az), resolver)
        .with_policy(project.retry.clone());
    if let Some(path) = &project.audit_log {
        orchestrator = orchestrator.with_audit_log(AuditLog::new(cwd.join(path)));
    }

    output.progress(&format!(
        "{} {} into {} ({})",
        match mode {
            Mode::Plan => "Planning",
            Mode::Deploy => "Deploying",
        },
        orchestrator.deployment_name(),
        orchestrator.config().resource_group,
        orchestrator.config().environment,
    ));

    let result = match mode {
        Mode::Plan => orchestrator.plan(cancel).await,
        Mode::Deploy => orchestrator.run(cancel).await,
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            emit(&output, &orchestrator.report());
            return Err(e.into());
        }
    };

    emit(&output, &report);
    output.success(&match mode {
        Mode::Plan => format!("Plan for {} ready", report.deployment),
        Mode::Deploy => format!("Deployed {}", report.deployment),
    });
    Ok(())
}

/// Command-line values first, then the project file.
fn build_config(args: DeployArgs, project: &ProjectConfig) -> Result<DeployConfig> {
    let template = args
        .template
        .or_else(|| project.template.clone())
        .ok_or(Error::MissingOption("--template"))?;

    let mut config = DeployConfig::new(
        args.resource_group,
        args.location,
        args.environment,
        template,
    );
    config.location_ml = args.location_ml;
    config.parameters = args.parameters;
    config.subscription_id = resolve_subscription(args.subscription_id);
    config.git_sha = args.git_sha;
    config.allow_warnings = args.allow_warnings;
    config.skip_health = args.skip_health;
    config.confirm_deletes = !args.no_confirm_deletes;
    Ok(config.with_project(project))
}

fn emit(output: &Output, report: &DeploymentReport) {
    for warning in &report.warnings {
        output.warning(&warning.message);
    }
    if let Some(regions) = &report.regions {
        output.progress(&format!(
            "  Regions: primary {}, ml {} ({})",
            regions.primary, regions.ml, regions.geography
        ));
    }
    for entry in &report.history {
        output.progress(&format!("  {} {}", entry.at.format("%H:%M:%S"), entry.state));
    }
    output.data("report", report);
}
