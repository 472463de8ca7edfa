// ABOUTME: Application-wide error types for cumulo.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

use crate::azure::AzError;
use crate::deploy::DriverError;
use crate::types::ResourceGroupName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    #[error(transparent)]
    Deploy(#[from] DriverError),

    #[error(transparent)]
    Az(#[from] AzError),

    #[error("resource group '{0}' does not exist")]
    ResourceGroupNotFound(ResourceGroupName),

    #[error("no deployments found in resource group '{0}'")]
    NoDeployments(ResourceGroupName),

    #[error("deployment {name} finished in state {state}")]
    DeploymentFailed { name: String, state: String },

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
