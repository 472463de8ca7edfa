// ABOUTME: Regional capability validation and region selection.
// ABOUTME: Curated fast path, fail-closed provider queries, tiered geography profiles.

mod capability;
mod geography;
mod provider;
mod resolver;

pub use capability::{Availability, KNOWN_GOOD_REGIONS, RegionCapabilityMap, provider_namespace};
pub use geography::{
    DEFAULT_GEOGRAPHY, GeographyProfile, GeographyProfiles, RegionSelection, geography_for_region,
};
pub use provider::{CapabilityProvider, ProviderError};
pub use resolver::{
    RegionRequest, RegionResolver, RegionRole, RegionSubstitution, RegionUnavailable,
    ResolvedRegions,
};
