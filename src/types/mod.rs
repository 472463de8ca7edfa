// ABOUTME: Validated domain types shared across the orchestrator.
// ABOUTME: Region identifiers and resource group names are checked on construction.

mod region_name;
mod resource_group;

pub use region_name::{RegionName, RegionNameError, normalize_region};
pub use resource_group::{ResourceGroupName, ResourceGroupNameError};
