// ABOUTME: Read-only resource group queries used by status and troubleshooting commands.
// ABOUTME: JMESPath projections keep the decoded shapes flat.

use serde::{Deserialize, Serialize};

use super::cli::{AzCli, AzError};
use crate::types::ResourceGroupName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupInfo {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub name: String,
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl DeploymentInfo {
    /// Whether Azure has stopped working on this deployment.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.provisioning_state.as_deref(),
            Some("Succeeded" | "Failed" | "Canceled")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub location: Option<String>,
}

const GROUP_QUERY: &str =
    "{name:name, location:location, provisioningState:properties.provisioningState}";
const DEPLOYMENTS_QUERY: &str = "sort_by([], &properties.timestamp)[].{name:name, \
     provisioningState:properties.provisioningState, timestamp:properties.timestamp, \
     duration:properties.duration}";
const FAILED_OPERATIONS_QUERY: &str = "[?properties.provisioningState=='Failed'].{\
     resourceType:properties.targetResource.resourceType, \
     resourceName:properties.targetResource.resourceName, \
     statusCode:properties.statusCode, \
     message:properties.statusMessage.error.message}";
const RESOURCES_QUERY: &str = "[].{name:name, type:type, location:location}";

impl AzCli {
    /// Resource group details, or `None` if it does not exist.
    pub async fn resource_group(
        &self,
        group: &ResourceGroupName,
    ) -> Result<Option<ResourceGroupInfo>, AzError> {
        let exists: bool = self
            .json(["group", "exists", "--name", group.as_str()])
            .await?;
        if !exists {
            return Ok(None);
        }
        self.json(["group", "show", "--name", group.as_str(), "--query", GROUP_QUERY])
            .await
            .map(Some)
    }

    /// Deployments in the group, oldest first.
    pub async fn deployments(
        &self,
        group: &ResourceGroupName,
    ) -> Result<Vec<DeploymentInfo>, AzError> {
        self.json([
            "deployment",
            "group",
            "list",
            "--resource-group",
            group.as_str(),
            "--query",
            DEPLOYMENTS_QUERY,
        ])
        .await
    }

    pub async fn latest_deployment(
        &self,
        group: &ResourceGroupName,
    ) -> Result<Option<DeploymentInfo>, AzError> {
        Ok(self.deployments(group).await?.pop())
    }

    pub async fn failed_operations(
        &self,
        group: &ResourceGroupName,
        deployment: &str,
    ) -> Result<Vec<OperationInfo>, AzError> {
        self.json([
            "deployment",
            "operation",
            "group",
            "list",
            "--resource-group",
            group.as_str(),
            "--name",
            deployment,
            "--query",
            FAILED_OPERATIONS_QUERY,
        ])
        .await
    }

    pub async fn resources(&self, group: &ResourceGroupName) -> Result<Vec<ResourceInfo>, AzError> {
        self.json([
            "resource",
            "list",
            "--resource-group",
            group.as_str(),
            "--query",
            RESOURCES_QUERY,
        ])
        .await
    }

    /// Start deleting the group without waiting for completion.
    pub async fn delete_group(&self, group: &ResourceGroupName) -> Result<(), AzError> {
        let output = self
            .run_scoped(["group", "delete", "--name", group.as_str(), "--yes", "--no-wait"])
            .await?;
        if output.success {
            Ok(())
        } else {
            Err(AzError::Failed {
                command: format!("group delete --name {group}"),
                message: output.error_text().to_string(),
            })
        }
    }
}
