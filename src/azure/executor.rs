// ABOUTME: Phase executor backed by the Azure CLI and Bicep tooling.
// ABOUTME: Raw command output is passed through for classification.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use super::cli::{AzCli, AzOutput};
use crate::config::DeployConfig;
use crate::deploy::{PhaseExecutor, PhaseFailure, PhaseReport};

/// Provisioning states that mean the deployment is still converging.
const IN_PROGRESS_STATES: &[&str] = &["Accepted", "Running", "Deploying", "Creating", "Updating"];

/// Runs deployment phases through `az`.
#[derive(Debug, Clone)]
pub struct AzExecutor {
    az: AzCli,
}

impl AzExecutor {
    pub fn new(az: AzCli) -> Self {
        Self { az }
    }

    async fn az(&self, args: Vec<String>) -> Result<AzOutput, PhaseFailure> {
        let output = self
            .az
            .run_scoped(&args)
            .await
            .map_err(|e| PhaseFailure::new(e.to_string()))?;
        if output.success {
            Ok(output)
        } else {
            Err(PhaseFailure::new(output.error_text()))
        }
    }
}

#[async_trait]
impl PhaseExecutor for AzExecutor {
    async fn validate_parameters(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        check_template(&config.template)?;
        if let Some(parameters) = &config.parameters {
            check_parameters_file(parameters)?;
        }
        Ok(PhaseReport::ok())
    }

    async fn lint(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        if !is_bicep(&config.template) {
            return Ok(PhaseReport::ok());
        }

        let args = vec![
            "bicep".to_string(),
            "lint".to_string(),
            "--file".to_string(),
            config.template.display().to_string(),
        ];
        let output = self
            .az
            .run(&args)
            .await
            .map_err(|e| PhaseFailure::new(e.to_string()))?;
        if !output.success {
            return Err(PhaseFailure::new(output.error_text()));
        }

        Ok(PhaseReport::ok().with_warnings(lint_warnings(&output)))
    }

    async fn plan(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        let mut validate: Vec<String> = vec!["deployment".into(), "group".into(), "validate".into()];
        validate.extend(template_args(config));
        validate.extend(["--output".into(), "none".into()]);
        self.az(validate).await?;

        let mut what_if: Vec<String> = vec!["deployment".into(), "group".into(), "what-if".into()];
        what_if.extend(template_args(config));
        what_if.extend([
            "--no-pretty-print".into(),
            "--output".into(),
            "json".into(),
        ]);
        let output = self.az(what_if).await?;

        let deletions = parse_what_if_deletions(&output.stdout)
            .map_err(|e| PhaseFailure::new(format!("unexpected what-if output: {e}")))?;
        Ok(PhaseReport::ok().with_deletions(deletions))
    }

    async fn deploy(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        let mut tags = vec![format!("environment={}", config.environment)];
        if let Some(sha) = &config.git_sha {
            tags.push(format!("gitSha={sha}"));
        }

        let mut create_group: Vec<String> = vec![
            "group".into(),
            "create".into(),
            "--name".into(),
            config.resource_group.to_string(),
            "--location".into(),
            config.location.to_string(),
            "--tags".into(),
        ];
        create_group.extend(tags);
        create_group.extend(["--output".into(), "none".into()]);
        self.az(create_group).await?;

        let mut create: Vec<String> = vec!["deployment".into(), "group".into(), "create".into()];
        create.extend(template_args(config));
        create.extend(["--output".into(), "none".into()]);
        self.az(create).await?;

        Ok(PhaseReport::ok())
    }

    async fn verify_health(&self, config: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        let name = config.deployment_name();
        let args: Vec<String> = vec![
            "deployment".into(),
            "group".into(),
            "show".into(),
            "--resource-group".into(),
            config.resource_group.to_string(),
            "--name".into(),
            name.clone(),
            "--query".into(),
            "properties.provisioningState".into(),
            "--output".into(),
            "tsv".into(),
        ];

        let output = tokio::time::timeout(config.health_timeout, self.az(args))
            .await
            .map_err(|_| {
                PhaseFailure::new(format!(
                    "health check timed out after {:?}",
                    config.health_timeout
                ))
            })??;

        let state = output.stdout.trim();
        if state == "Succeeded" {
            Ok(PhaseReport::ok())
        } else if IN_PROGRESS_STATES.contains(&state) {
            Err(PhaseFailure::new(format!(
                "health check timeout: deployment {name} is still {state}"
            )))
        } else {
            Err(PhaseFailure::new(format!(
                "deployment {name} finished with provisioning state {state}"
            )))
        }
    }
}

fn is_bicep(template: &Path) -> bool {
    template.extension().and_then(|e| e.to_str()) == Some("bicep")
}

fn check_template(template: &Path) -> Result<(), PhaseFailure> {
    if !template.is_file() {
        return Err(PhaseFailure::new(format!(
            "missing required template file: {}",
            template.display()
        )));
    }
    match template.extension().and_then(|e| e.to_str()) {
        Some("bicep" | "json") => Ok(()),
        _ => Err(PhaseFailure::new(format!(
            "invalid template {}: expected a .bicep or .json file",
            template.display()
        ))),
    }
}

fn check_parameters_file(path: &Path) -> Result<(), PhaseFailure> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PhaseFailure::new(format!(
            "missing required parameters file {}: {e}",
            path.display()
        ))
    })?;

    // .bicepparam files are checked by the validate call during planning.
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Ok(());
    }

    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        PhaseFailure::new(format!("invalid parameters file {}: {e}", path.display()))
    })?;
    if !value.get("parameters").is_some_and(serde_json::Value::is_object) {
        return Err(PhaseFailure::new(format!(
            "invalid parameters file {}: missing required \"parameters\" object",
            path.display()
        )));
    }
    Ok(())
}

fn template_args(config: &DeployConfig) -> Vec<String> {
    let mut args = vec![
        "--resource-group".to_string(),
        config.resource_group.to_string(),
        "--name".to_string(),
        config.deployment_name(),
        "--template-file".to_string(),
        config.template.display().to_string(),
    ];
    if let Some(parameters) = &config.parameters {
        args.push("--parameters".to_string());
        args.push(format!("@{}", parameters.display()));
    }
    args.push("--parameters".to_string());
    args.push(format!("environment={}", config.environment));
    args.push(format!("location={}", config.location));
    if let Some(ml) = &config.location_ml {
        args.push(format!("mlLocation={ml}"));
    }
    args
}

/// Lines of lint output that report a warning.
fn lint_warnings(output: &AzOutput) -> Vec<String> {
    output
        .stdout
        .lines()
        .chain(output.stderr.lines())
        .map(str::trim)
        .filter(|line| line.contains(": Warning "))
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
struct WhatIfResult {
    #[serde(default)]
    changes: Vec<WhatIfChange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfChange {
    change_type: String,
    resource_id: String,
}

fn parse_what_if_deletions(stdout: &str) -> Result<Vec<String>, serde_json::Error> {
    let result: WhatIfResult = serde_json::from_str(stdout)?;
    Ok(result
        .changes
        .into_iter()
        .filter(|c| c.change_type == "Delete")
        .map(|c| c.resource_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::types::{RegionName, ResourceGroupName};
    use std::path::PathBuf;

    fn config(template: PathBuf) -> DeployConfig {
        DeployConfig::new(
            ResourceGroupName::new("rg-app").unwrap(),
            RegionName::new("eastus").unwrap(),
            Environment::Dev,
            template,
        )
    }

    #[test]
    fn what_if_deletions_are_extracted() {
        let json = r#"{
            "status": "Succeeded",
            "changes": [
                {"changeType": "Create", "resourceId": "/subscriptions/x/rg/a"},
                {"changeType": "Delete", "resourceId": "/subscriptions/x/rg/b"},
                {"changeType": "NoChange", "resourceId": "/subscriptions/x/rg/c"}
            ]
        }"#;
        assert_eq!(
            parse_what_if_deletions(json).unwrap(),
            vec!["/subscriptions/x/rg/b".to_string()]
        );
    }

    #[test]
    fn lint_warnings_are_collected_from_both_streams() {
        let output = AzOutput {
            success: true,
            exit_code: Some(0),
            stdout: "main.bicep(3,7) : Warning no-unused-params: Parameter \"x\" is declared but never used.\n".into(),
            stderr: "main.bicep(9,1) : Warning prefer-interpolation: Use string interpolation.\nWARNING: A new Bicep release is available\n".into(),
        };
        assert_eq!(lint_warnings(&output).len(), 2);
    }

    #[test]
    fn template_args_include_overrides() {
        let mut config = config(PathBuf::from("infra/main.bicep"));
        config.parameters = Some(PathBuf::from("infra/dev.json"));
        config.location_ml = Some(RegionName::new("westus2").unwrap());
        config.git_sha = Some("0123456789abcdef".into());

        let args = template_args(&config);
        assert!(args.contains(&"@infra/dev.json".to_string()));
        assert!(args.contains(&"environment=dev".to_string()));
        assert!(args.contains(&"location=eastus".to_string()));
        assert!(args.contains(&"mlLocation=westus2".to_string()));
        assert!(args.contains(&"cumulo-dev-0123456789ab".to_string()));
    }

    #[test]
    fn missing_template_is_reported() {
        let err = check_template(Path::new("/nonexistent/main.bicep")).unwrap_err();
        assert!(err.message().contains("missing required template"));
    }

    #[test]
    fn wrong_template_extension_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.txt");
        std::fs::write(&path, "").unwrap();
        let err = check_template(&path).unwrap_err();
        assert!(err.message().contains("invalid template"));
    }

    #[test]
    fn parameters_file_needs_parameters_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");

        std::fs::write(&path, r#"{"$schema": "x"}"#).unwrap();
        assert!(check_parameters_file(&path).is_err());

        std::fs::write(&path, r#"{"parameters": {"sku": {"value": "S1"}}}"#).unwrap();
        assert!(check_parameters_file(&path).is_ok());

        std::fs::write(&path, "{ not json").unwrap();
        let err = check_parameters_file(&path).unwrap_err();
        assert!(err.message().starts_with("invalid parameters file"));
    }
}
