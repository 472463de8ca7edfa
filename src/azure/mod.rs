// ABOUTME: Azure CLI integration: the process that actually runs `az` commands.
// ABOUTME: Provides the phase executor, capability provider, and resource group queries.

mod cli;
mod executor;
mod provider;
mod queries;

pub use cli::{AzCli, AzError, AzOutput};
pub use executor::AzExecutor;
pub use queries::{DeploymentInfo, OperationInfo, ResourceGroupInfo, ResourceInfo};
