// ABOUTME: Capability provider backed by `az provider show`.
// ABOUTME: Lists the regions where a resource provider namespace is deployed.

use async_trait::async_trait;

use super::cli::AzCli;
use crate::region::{CapabilityProvider, ProviderError};

#[async_trait]
impl CapabilityProvider for AzCli {
    async fn provider_regions(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        let output = self
            .run_scoped([
                "provider",
                "show",
                "--namespace",
                namespace,
                "--query",
                "resourceTypes[].locations[]",
                "--output",
                "json",
            ])
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !output.success {
            return Err(ProviderError::Transport(output.error_text().to_string()));
        }

        let mut regions: Vec<String> = serde_json::from_str(&output.stdout)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        regions.sort();
        regions.dedup();
        Ok(regions)
    }
}
