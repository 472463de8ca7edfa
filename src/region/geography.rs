// ABOUTME: Geography profiles and tier-indexed region selection.
// ABOUTME: Lower environments get less-proven regions; prod gets the most proven.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::Environment;
use crate::types::{RegionName, normalize_region};

/// Geography used when the requested one is not recognized.
pub const DEFAULT_GEOGRAPHY: &str = "americas";

/// Candidate regions for one geography, ordered least- to most-proven.
#[derive(Debug, Clone, Deserialize)]
pub struct GeographyProfile {
    #[serde(deserialize_with = "deserialize_regions")]
    pub primary: NonEmpty<RegionName>,

    #[serde(deserialize_with = "deserialize_regions")]
    pub ml: NonEmpty<RegionName>,
}

impl GeographyProfile {
    pub fn new(primary: NonEmpty<RegionName>, ml: NonEmpty<RegionName>) -> Self {
        Self { primary, ml }
    }

    /// Pick the candidate at `min(tier, len - 1)` from each list.
    pub fn select(&self, environment: Environment) -> RegionSelection {
        RegionSelection {
            primary: pick(&self.primary, environment.tier()).clone(),
            ml: pick(&self.ml, environment.tier()).clone(),
        }
    }
}

fn pick(candidates: &NonEmpty<RegionName>, tier: usize) -> &RegionName {
    let index = tier.min(candidates.len() - 1);
    candidates.get(index).unwrap_or(candidates.last())
}

/// Regions chosen for a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSelection {
    pub primary: RegionName,
    pub ml: RegionName,
}

/// Table of geography profiles keyed by lower-case geography name.
#[derive(Debug, Clone)]
pub struct GeographyProfiles {
    profiles: BTreeMap<String, GeographyProfile>,
}

impl GeographyProfiles {
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "americas".to_string(),
            GeographyProfile::new(
                builtin_regions(&["westus3", "westus2", "eastus"]),
                builtin_regions(&["southcentralus", "eastus2", "eastus"]),
            ),
        );
        profiles.insert(
            "europe".to_string(),
            GeographyProfile::new(
                builtin_regions(&["westeurope", "northeurope", "uksouth"]),
                builtin_regions(&["westeurope", "northeurope", "uksouth"]),
            ),
        );
        profiles.insert(
            "asia".to_string(),
            GeographyProfile::new(
                builtin_regions(&["koreacentral", "japaneast", "southeastasia"]),
                builtin_regions(&["japaneast", "southeastasia"]),
            ),
        );
        profiles.insert(
            "australia".to_string(),
            GeographyProfile::new(
                builtin_regions(&["australiasoutheast", "australiaeast"]),
                builtin_regions(&["australiaeast"]),
            ),
        );
        Self { profiles }
    }

    /// Add or replace profiles. The default geography can be overridden but
    /// never removed.
    pub fn extend(&mut self, overrides: HashMap<String, GeographyProfile>) {
        for (name, profile) in overrides {
            self.profiles.insert(name.trim().to_lowercase(), profile);
        }
    }

    pub fn get(&self, geography: &str) -> Option<&GeographyProfile> {
        self.profiles.get(&geography.trim().to_lowercase())
    }

    /// Resolve `geography`, falling back to [`DEFAULT_GEOGRAPHY`].
    ///
    /// Returns the name of the profile actually used alongside it.
    pub fn resolve(&self, geography: &str) -> (&str, &GeographyProfile) {
        let found = self.profiles.get_key_value(&geography.trim().to_lowercase());
        let (name, profile) = found.unwrap_or_else(|| {
            tracing::debug!(geography, fallback = DEFAULT_GEOGRAPHY, "unrecognized geography");
            self.profiles
                .get_key_value(DEFAULT_GEOGRAPHY)
                .expect("builtin profiles always contain the default geography")
        });
        (name.as_str(), profile)
    }

    pub fn select(&self, environment: Environment, geography: &str) -> RegionSelection {
        self.resolve(geography).1.select(environment)
    }
}

impl Default for GeographyProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_regions(names: &[&str]) -> NonEmpty<RegionName> {
    let regions: Vec<RegionName> = names
        .iter()
        .map(|name| RegionName::new(name).expect("builtin region names are valid"))
        .collect();
    NonEmpty::from_vec(regions).expect("builtin candidate lists are non-empty")
}

const EUROPE_MARKERS: &[&str] = &[
    "europe", "uk", "france", "germany", "sweden", "norway", "switzerland", "poland", "italy",
    "spain", "austria",
];
const ASIA_MARKERS: &[&str] = &["asia", "japan", "korea", "india", "indonesia", "malaysia"];
const AMERICAS_MARKERS: &[&str] = &["canada", "brazil", "mexico", "chile"];

/// Infer the geography of a region identifier ("uksouth" is in "europe").
pub fn geography_for_region(region: &str) -> Option<&'static str> {
    let region = normalize_region(region);
    let has = |markers: &[&str]| markers.iter().any(|m| region.contains(m));

    if region.starts_with("australia") {
        Some("australia")
    } else if has(EUROPE_MARKERS) {
        Some("europe")
    } else if has(ASIA_MARKERS) {
        Some("asia")
    } else if has(AMERICAS_MARKERS)
        || region.trim_end_matches(|c: char| c.is_ascii_digit()).ends_with("us")
    {
        Some("americas")
    } else {
        None
    }
}

fn deserialize_regions<'de, D>(deserializer: D) -> Result<NonEmpty<RegionName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let regions: Vec<RegionName> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(regions)
        .ok_or_else(|| serde::de::Error::custom("candidate region list cannot be empty"))
}
