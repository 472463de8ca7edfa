// ABOUTME: Integration tests for project config loading and deploy config assembly.
// ABOUTME: Covers discovery, defaults, geography overrides, and environment fallbacks.

use cumulo::config::{
    CONFIG_FILENAME, DeployConfig, Environment, ProjectConfig, SUBSCRIPTION_ENV,
    resolve_subscription,
};
use cumulo::types::{RegionName, ResourceGroupName};
use std::fs;
use std::time::Duration;

fn deploy_config(environment: Environment) -> DeployConfig {
    DeployConfig::new(
        ResourceGroupName::new("rg-app").unwrap(),
        RegionName::new("westeurope").unwrap(),
        environment,
        "infra/main.bicep".into(),
    )
}

#[test]
fn empty_file_uses_defaults() {
    let config = ProjectConfig::from_yaml("{}").unwrap();
    assert_eq!(config.services, vec!["storage", "keyvault"]);
    assert!(config.ml_services.is_empty());
    assert_eq!(config.health_timeout, Duration::from_secs(300));
    assert_eq!(config.retry.base_delay, Duration::from_secs(5));
    assert_eq!(config.retry.max_retries, 3);
    assert!(!config.retry.retry_unknown);
}

#[test]
fn full_file_parses() {
    let yaml = r#"
template: infra/main.bicep
parameters: infra/dev.parameters.json
services: [storage, keyvault, cosmosdb]
ml_services: [machinelearning]
geography: europe
health_timeout: 2m
audit_log: .cumulo/audit.jsonl
retry:
  base_delay: 2s
  max_retries: 5
geographies:
  nordics:
    primary: [swedencentral, norwayeast]
    ml: [swedencentral]
"#;
    let config = ProjectConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.health_timeout, Duration::from_secs(120));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.ml_services, vec!["machinelearning"]);

    let profiles = config.geography_profiles();
    let nordics = profiles.select(Environment::Staging, "nordics");
    assert_eq!(nordics.primary.as_str(), "norwayeast");
    assert_eq!(nordics.ml.as_str(), "swedencentral");
    // Built-ins survive alongside overrides.
    assert!(profiles.get("europe").is_some());
}

#[test]
fn empty_candidate_list_is_rejected() {
    let yaml = "geographies:\n  empty:\n    primary: []\n    ml: [eastus]\n";
    assert!(ProjectConfig::from_yaml(yaml).is_err());
}

#[test]
fn blank_service_name_is_rejected() {
    assert!(ProjectConfig::from_yaml("services: [storage, ' ']").is_err());
}

#[test]
fn zero_base_delay_is_rejected() {
    assert!(ProjectConfig::from_yaml("retry:\n  base_delay: 0s\n").is_err());
}

#[test]
fn discover_finds_config_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ProjectConfig::discover(dir.path()).unwrap().is_none());

    fs::write(dir.path().join(CONFIG_FILENAME), "geography: asia\n").unwrap();
    let config = ProjectConfig::discover(dir.path()).unwrap().unwrap();
    assert_eq!(config.geography.as_deref(), Some("asia"));
}

#[test]
fn discover_checks_dot_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(".cumulo")).unwrap();
    fs::write(dir.path().join(".cumulo/config.yml"), "services: [storage]\n").unwrap();

    let config = ProjectConfig::discover(dir.path()).unwrap().unwrap();
    assert_eq!(config.services, vec!["storage"]);
}

#[test]
fn project_values_fill_unset_options() {
    let project = ProjectConfig::from_yaml(
        "parameters: p.json\ngeography: europe\nservices: [storage]\nhealth_timeout: 30s\n",
    )
    .unwrap();

    let config = deploy_config(Environment::Dev).with_project(&project);
    assert_eq!(config.parameters.as_deref(), Some(std::path::Path::new("p.json")));
    assert_eq!(config.geography.as_deref(), Some("europe"));
    assert_eq!(config.services, vec!["storage"]);
    assert_eq!(config.health_timeout, Duration::from_secs(30));

    let mut explicit = deploy_config(Environment::Dev);
    explicit.parameters = Some("cli.json".into());
    let explicit = explicit.with_project(&project);
    assert_eq!(explicit.parameters.as_deref(), Some(std::path::Path::new("cli.json")));
}

#[test]
fn deployment_name_uses_short_git_sha() {
    let mut config = deploy_config(Environment::Prod);
    config.git_sha = Some("a1b2c3d4e5f6a7b8c9d0".to_string());
    assert_eq!(config.deployment_name(), "cumulo-prod-a1b2c3d4e5f6");
}

#[test]
fn deployment_name_is_stable_without_sha() {
    let config = deploy_config(Environment::Staging);
    let name = config.deployment_name();
    assert!(name.starts_with("cumulo-staging-"));
    assert_eq!(name, config.deployment_name());
}

#[test]
fn region_request_carries_deploy_settings() {
    let mut config = deploy_config(Environment::Prod);
    config.location_ml = Some(RegionName::new("northeurope").unwrap());
    let request = config.region_request();
    assert_eq!(request.environment, Environment::Prod);
    assert_eq!(request.primary.as_str(), "westeurope");
    assert_eq!(request.ml.as_ref().map(|r| r.as_str()), Some("northeurope"));
}

#[test]
fn explicit_subscription_wins_over_environment() {
    temp_env::with_var(SUBSCRIPTION_ENV, Some("from-env"), || {
        assert_eq!(
            resolve_subscription(Some("explicit".to_string())).as_deref(),
            Some("explicit")
        );
        assert_eq!(resolve_subscription(None).as_deref(), Some("from-env"));
    });
}

#[test]
fn blank_subscription_is_ignored() {
    temp_env::with_var(SUBSCRIPTION_ENV, Some("  "), || {
        assert_eq!(resolve_subscription(None), None);
    });
    temp_env::with_var_unset(SUBSCRIPTION_ENV, || {
        assert_eq!(resolve_subscription(None), None);
    });
}

#[test]
fn environment_names_and_aliases_parse() {
    assert_eq!("prod".parse::<Environment>(), Ok(Environment::Prod));
    assert_eq!("STAGING".parse::<Environment>(), Ok(Environment::Staging));
    assert!("qa".parse::<Environment>().is_err());
    assert_eq!(Environment::Dev.tier(), 0);
    assert_eq!(Environment::Prod.tier(), 2);
}
