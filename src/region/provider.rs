// ABOUTME: Capability-provider query seam used by the resolver's slow path.
// ABOUTME: Implementations report where a resource provider namespace is deployed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Source of truth for where a resource provider namespace is deployed.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Region display names (e.g. "East US") where `namespace` has resource types.
    async fn provider_regions(&self, namespace: &str) -> Result<Vec<String>, ProviderError>;
}

#[async_trait]
impl<P: CapabilityProvider + ?Sized> CapabilityProvider for Arc<P> {
    async fn provider_regions(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        (**self).provider_regions(namespace).await
    }
}

/// Errors from a capability-provider query. The resolver treats all of them
/// as "no regions reported".
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider query failed: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Parse(String),

    #[error("provider query timed out after {0:?}")]
    Timeout(Duration),
}
