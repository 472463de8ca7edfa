// ABOUTME: Region capability resolver: validates regions and picks substitutes.
// ABOUTME: Provider queries fan out with a bound and fail closed on any error.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::capability::{Availability, RegionCapabilityMap, is_known_good, provider_namespace};
use super::geography::{DEFAULT_GEOGRAPHY, GeographyProfiles, RegionSelection, geography_for_region};
use super::provider::{CapabilityProvider, ProviderError};
use crate::config::Environment;
use crate::types::{RegionName, normalize_region};

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;

/// Validates regional service support and selects regions per environment.
pub struct RegionResolver<P> {
    provider: P,
    profiles: GeographyProfiles,
    query_timeout: Duration,
    max_concurrent_queries: usize,
}

impl<P: CapabilityProvider> RegionResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            profiles: GeographyProfiles::builtin(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }

    pub fn with_profiles(mut self, profiles: GeographyProfiles) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_queries(mut self, limit: usize) -> Self {
        self.max_concurrent_queries = limit.max(1);
        self
    }

    /// Report, per capability, whether `region` supports it.
    ///
    /// Known-good regions answer without any query. Otherwise each capability
    /// is checked against its provider namespace; unmapped capabilities and
    /// failed queries are reported unavailable.
    pub async fn validate_region<S: AsRef<str>>(
        &self,
        region: &str,
        services: &[S],
    ) -> RegionCapabilityMap {
        let region = normalize_region(region);

        if is_known_good(&region) {
            tracing::debug!(%region, "known-good region, skipping provider queries");
            return services
                .iter()
                .map(|s| (s.as_ref().to_string(), true))
                .collect();
        }

        let region = region.as_str();
        stream::iter(services.iter().map(|s| s.as_ref().to_string()))
            .map(|capability| async move {
                let available = self.capability_available(region, &capability).await;
                (capability, available)
            })
            .buffer_unordered(self.max_concurrent_queries)
            .collect()
            .await
    }

    /// [`validate_region`](Self::validate_region) projected for display.
    pub async fn region_summary<S: AsRef<str>>(
        &self,
        region: &str,
        services: &[S],
    ) -> BTreeMap<String, Availability> {
        self.validate_region(region, services)
            .await
            .into_iter()
            .map(|(capability, available)| (capability, Availability::from(available)))
            .collect()
    }

    /// Pick primary and ML regions for an environment tier within a geography.
    pub fn select_optimal_regions(
        &self,
        environment: Environment,
        geography: &str,
    ) -> RegionSelection {
        self.profiles.select(environment, geography)
    }

    /// Confirm the requested regions or substitute the profile's choice.
    ///
    /// Fails only when neither the requested region nor its substitute is
    /// confirmed for every required capability.
    pub async fn resolve_deployment_regions(
        &self,
        request: &RegionRequest,
    ) -> Result<ResolvedRegions, RegionUnavailable> {
        let requested = request
            .geography
            .as_deref()
            .or_else(|| geography_for_region(request.primary.as_str()))
            .unwrap_or(DEFAULT_GEOGRAPHY);
        let (geography, profile) = self.profiles.resolve(requested);
        let geography = geography.to_string();
        let suggestion = profile.select(request.environment);

        let mut substitutions = Vec::new();
        let primary = self
            .confirm_or_substitute(
                RegionRole::Primary,
                &request.primary,
                &suggestion.primary,
                &request.services,
                &mut substitutions,
            )
            .await?;

        let requested_ml = request.ml.as_ref().unwrap_or(&suggestion.ml);
        let ml = if request.ml_services.is_empty() {
            requested_ml.clone()
        } else {
            self.confirm_or_substitute(
                RegionRole::Ml,
                requested_ml,
                &suggestion.ml,
                &request.ml_services,
                &mut substitutions,
            )
            .await?
        };

        Ok(ResolvedRegions {
            geography,
            primary,
            ml,
            substitutions,
        })
    }

    async fn confirm_or_substitute(
        &self,
        role: RegionRole,
        requested: &RegionName,
        fallback: &RegionName,
        services: &[String],
        substitutions: &mut Vec<RegionSubstitution>,
    ) -> Result<RegionName, RegionUnavailable> {
        let missing = unavailable(&self.validate_region(requested.as_str(), services).await);
        if missing.is_empty() {
            return Ok(requested.clone());
        }

        if fallback != requested {
            let fallback_missing =
                unavailable(&self.validate_region(fallback.as_str(), services).await);
            if fallback_missing.is_empty() {
                tracing::warn!(
                    %role,
                    requested = %requested,
                    substitute = %fallback,
                    ?missing,
                    "substituting region"
                );
                substitutions.push(RegionSubstitution {
                    role,
                    requested: requested.clone(),
                    chosen: fallback.clone(),
                    missing,
                });
                return Ok(fallback.clone());
            }
        }

        Err(RegionUnavailable {
            role,
            region: requested.clone(),
            fallback: fallback.clone(),
            missing,
        })
    }

    async fn capability_available(&self, region: &str, capability: &str) -> bool {
        let Some(namespace) = provider_namespace(capability) else {
            tracing::warn!(capability, "no provider namespace known for capability");
            return false;
        };

        let result =
            match tokio::time::timeout(self.query_timeout, self.provider.provider_regions(namespace))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.query_timeout)),
            };

        match result {
            Ok(regions) => regions.iter().any(|r| normalize_region(r) == region),
            Err(e) => {
                tracing::warn!(namespace, region, error = %e, "provider query failed, treating as unavailable");
                false
            }
        }
    }
}

fn unavailable(map: &RegionCapabilityMap) -> Vec<String> {
    map.iter()
        .filter(|(_, available)| !**available)
        .map(|(capability, _)| capability.clone())
        .collect()
}

/// Inputs for planning-time region resolution.
#[derive(Debug, Clone)]
pub struct RegionRequest {
    pub environment: Environment,
    pub primary: RegionName,
    pub ml: Option<RegionName>,
    pub geography: Option<String>,
    pub services: Vec<String>,
    pub ml_services: Vec<String>,
}

/// Which of a deployment's regions a decision applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionRole {
    Primary,
    Ml,
}

impl fmt::Display for RegionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionRole::Primary => f.write_str("primary"),
            RegionRole::Ml => f.write_str("ml"),
        }
    }
}

/// A requested region replaced by the geography profile's choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSubstitution {
    pub role: RegionRole,
    pub requested: RegionName,
    pub chosen: RegionName,
    pub missing: Vec<String>,
}

/// Regions confirmed during planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRegions {
    pub geography: String,
    pub primary: RegionName,
    pub ml: RegionName,
    pub substitutions: Vec<RegionSubstitution>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{role} region {region} does not confirm {missing:?}, and substitute {fallback} is not confirmed either")]
pub struct RegionUnavailable {
    pub role: RegionRole,
    pub region: RegionName,
    pub fallback: RegionName,
    pub missing: Vec<String>,
}
