// ABOUTME: Configuration for cumulo: optional cumulo.yml plus per-run deploy settings.
// ABOUTME: Handles YAML parsing, file discovery, and merging CLI values over file values.

mod environment;

pub use environment::{Environment, ParseEnvironmentError};

use crate::error::{Error, Result};
use crate::failure::RetryPolicy;
use crate::region::{GeographyProfile, GeographyProfiles, RegionRequest};
use crate::types::{RegionName, ResourceGroupName};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cumulo.yml";
pub const CONFIG_FILENAME_ALT: &str = "cumulo.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cumulo/config.yml";

/// Environment variable consulted when `--subscription-id` is not given.
pub const SUBSCRIPTION_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// Project-level settings read from `cumulo.yml`. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub template: Option<PathBuf>,

    #[serde(default)]
    pub parameters: Option<PathBuf>,

    /// Capabilities the primary region must support.
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Capabilities the ML region must support.
    #[serde(default)]
    pub ml_services: Vec<String>,

    #[serde(default)]
    pub geography: Option<String>,

    #[serde(default = "default_health_timeout", with = "humantime_serde")]
    pub health_timeout: Duration,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Append-only JSON-lines file recording every state transition.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,

    #[serde(default)]
    pub geographies: HashMap<String, GeographyProfile>,
}

fn default_services() -> Vec<String> {
    vec!["storage".to_string(), "keyvault".to_string()]
}

fn default_health_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            template: None,
            parameters: None,
            services: default_services(),
            ml_services: Vec::new(),
            geography: None,
            health_timeout: default_health_timeout(),
            retry: RetryPolicy::default(),
            audit_log: None,
            geographies: HashMap::new(),
        }
    }
}

impl ProjectConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ProjectConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or `None` if there is none.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading project config");
                return Self::load(path).map(Some);
            }
        }

        Ok(None)
    }

    /// Built-in geography profiles with this project's overrides applied.
    pub fn geography_profiles(&self) -> GeographyProfiles {
        let mut profiles = GeographyProfiles::builtin();
        profiles.extend(self.geographies.clone());
        profiles
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = self
            .services
            .iter()
            .chain(&self.ml_services)
            .find(|s| s.trim().is_empty())
        {
            return Err(Error::InvalidConfig(format!(
                "service capability names cannot be blank: {name:?}"
            )));
        }

        if self.retry.base_delay.is_zero() && self.retry.max_retries > 0 {
            return Err(Error::InvalidConfig(
                "retry.base_delay must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings for one deployment run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub resource_group: ResourceGroupName,
    pub location: RegionName,
    pub location_ml: Option<RegionName>,
    pub environment: Environment,
    pub template: PathBuf,
    pub parameters: Option<PathBuf>,
    pub subscription_id: Option<String>,
    pub git_sha: Option<String>,
    pub allow_warnings: bool,
    pub skip_health: bool,
    pub confirm_deletes: bool,
    pub services: Vec<String>,
    pub ml_services: Vec<String>,
    pub geography: Option<String>,
    pub health_timeout: Duration,
    pub created_at: DateTime<Utc>,
}

impl DeployConfig {
    pub fn new(
        resource_group: ResourceGroupName,
        location: RegionName,
        environment: Environment,
        template: PathBuf,
    ) -> Self {
        let defaults = ProjectConfig::default();
        DeployConfig {
            resource_group,
            location,
            location_ml: None,
            environment,
            template,
            parameters: None,
            subscription_id: None,
            git_sha: None,
            allow_warnings: false,
            skip_health: false,
            confirm_deletes: true,
            services: defaults.services,
            ml_services: defaults.ml_services,
            geography: None,
            health_timeout: defaults.health_timeout,
            created_at: Utc::now(),
        }
    }

    /// Fill values not set on the command line from the project file.
    pub fn with_project(mut self, project: &ProjectConfig) -> Self {
        if self.parameters.is_none() {
            self.parameters = project.parameters.clone();
        }
        if self.geography.is_none() {
            self.geography = project.geography.clone();
        }
        self.services = project.services.clone();
        self.ml_services = project.ml_services.clone();
        self.health_timeout = project.health_timeout;
        self
    }

    /// Azure deployment name: `cumulo-<env>-<sha>`, or the creation time
    /// when no git SHA was given. Stable for the life of the config.
    pub fn deployment_name(&self) -> String {
        let suffix = self
            .git_sha
            .as_deref()
            .map(|sha| {
                sha.chars()
                    .filter(char::is_ascii_alphanumeric)
                    .take(12)
                    .collect::<String>()
            })
            .filter(|sha| !sha.is_empty())
            .unwrap_or_else(|| self.created_at.format("%Y%m%d%H%M%S").to_string());
        format!("cumulo-{}-{}", self.environment, suffix)
    }

    pub fn region_request(&self) -> RegionRequest {
        RegionRequest {
            environment: self.environment,
            primary: self.location.clone(),
            ml: self.location_ml.clone(),
            geography: self.geography.clone(),
            services: self.services.clone(),
            ml_services: self.ml_services.clone(),
        }
    }
}

/// Explicit subscription, else the `AZURE_SUBSCRIPTION_ID` environment variable.
pub fn resolve_subscription(explicit: Option<String>) -> Option<String> {
    explicit
        .or_else(|| std::env::var(SUBSCRIPTION_ENV).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
