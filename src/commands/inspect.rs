// ABOUTME: Read-only commands: status, monitor, troubleshoot, list-resources.
// ABOUTME: Query the resource group through az and report in the selected output mode.

use super::az_for;
use crate::cli::GroupArgs;
use cumulo::config::ProjectConfig;
use cumulo::deploy::{AuditLog, CancelToken};
use cumulo::error::{Error, Result};
use cumulo::failure::{FailureClassifier, FailureType};
use cumulo::output::Output;
use serde::Serialize;
use std::env;
use std::time::Duration;

const MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(10);

pub async fn status(args: GroupArgs, output: &Output) -> Result<()> {
    let az = az_for(&args);
    let group = az
        .resource_group(&args.resource_group)
        .await?
        .ok_or_else(|| Error::ResourceGroupNotFound(args.resource_group.clone()))?;
    output.data("resource_group", &group);
    output.progress(&format!(
        "Resource group: {} ({}, {})",
        group.name,
        group.location,
        group.provisioning_state.as_deref().unwrap_or("unknown")
    ));

    match az.latest_deployment(&args.resource_group).await? {
        Some(deployment) => {
            output.data("deployment", &deployment);
            output.success(&format!(
                "Latest deployment {}: {}",
                deployment.name,
                deployment.provisioning_state.as_deref().unwrap_or("unknown")
            ));
            audit_trail(&deployment.name, output)?;
        }
        None => output.success("No deployments"),
    }
    Ok(())
}

/// Local transitions recorded for the deployment, when an audit log is configured.
fn audit_trail(deployment: &str, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let Some(path) = ProjectConfig::discover(&cwd)?.and_then(|p| p.audit_log) else {
        return Ok(());
    };
    let path = cwd.join(path);
    if !path.exists() {
        return Ok(());
    }

    for record in AuditLog::read(&path)?
        .into_iter()
        .filter(|r| r.deployment == deployment)
    {
        output.progress(&format!(
            "  {} {} on {}{}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.state,
            record.host,
            record
                .context
                .as_deref()
                .map(|c| format!(" ({c})"))
                .unwrap_or_default()
        ));
        output.data("audit", &record);
    }
    Ok(())
}

pub async fn monitor(args: GroupArgs, cancel: &CancelToken, output: &Output) -> Result<()> {
    let az = az_for(&args);
    let mut last_state: Option<String> = None;

    loop {
        let deployment = az
            .latest_deployment(&args.resource_group)
            .await?
            .ok_or_else(|| Error::NoDeployments(args.resource_group.clone()))?;
        let state = deployment
            .provisioning_state
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());

        if last_state.as_deref() != Some(state.as_str()) {
            output.progress(&format!("{}: {}", deployment.name, state));
            output.data("deployment", &deployment);
            last_state = Some(state.clone());
        }

        if deployment.is_finished() {
            if state == "Succeeded" {
                output.success(&format!("{} succeeded", deployment.name));
                return Ok(());
            }
            return Err(Error::DeploymentFailed {
                name: deployment.name,
                state,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(Error::Aborted("monitoring interrupted".to_string()));
            }
            _ = tokio::time::sleep(MONITOR_POLL_INTERVAL) => {}
        }
    }
}

#[derive(Serialize)]
struct Diagnosis<'a> {
    resource: String,
    status_code: Option<&'a str>,
    message: &'a str,
    category: FailureType,
    recommendation: &'static str,
}

pub async fn troubleshoot(args: GroupArgs, output: &Output) -> Result<()> {
    let az = az_for(&args);
    let deployment = az
        .latest_deployment(&args.resource_group)
        .await?
        .ok_or_else(|| Error::NoDeployments(args.resource_group.clone()))?;
    let operations = az
        .failed_operations(&args.resource_group, &deployment.name)
        .await?;

    if operations.is_empty() {
        output.success(&format!("No failed operations in {}", deployment.name));
        return Ok(());
    }

    let classifier = FailureClassifier::new();
    for op in &operations {
        let message = op.message.as_deref().unwrap_or("");
        let category = classifier.classify(message);
        let diagnosis = Diagnosis {
            resource: format!(
                "{}/{}",
                op.resource_type.as_deref().unwrap_or("?"),
                op.resource_name.as_deref().unwrap_or("?")
            ),
            status_code: op.status_code.as_deref(),
            message,
            category,
            recommendation: category.recommendation(),
        };
        output.progress(&format!(
            "{} [{}]: {}\n  {}",
            diagnosis.resource, diagnosis.category, diagnosis.message, diagnosis.recommendation
        ));
        output.data("diagnosis", &diagnosis);
    }
    output.success(&format!(
        "{} failed operation(s) in {}",
        operations.len(),
        deployment.name
    ));
    Ok(())
}

pub async fn list_resources(args: GroupArgs, output: &Output) -> Result<()> {
    let az = az_for(&args);
    let resources = az.resources(&args.resource_group).await?;
    for resource in &resources {
        output.progress(&format!(
            "{:<40} {:<50} {}",
            resource.name,
            resource.resource_type,
            resource.location.as_deref().unwrap_or("-")
        ));
    }
    output.data("resources", &resources);
    output.success(&format!("{} resource(s)", resources.len()));
    Ok(())
}
