// ABOUTME: Normalized Azure region identifier.
// ABOUTME: Accepts display names like "East US" and stores them as "eastus".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionNameError {
    #[error("region name cannot be empty")]
    Empty,

    #[error("invalid character in region name: '{0}'")]
    InvalidChar(char),
}

/// A region identifier in normalized form (lower-case, no whitespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionName(String);

impl RegionName {
    pub fn new(value: &str) -> Result<Self, RegionNameError> {
        let normalized = normalize_region(value);
        if normalized.is_empty() {
            return Err(RegionNameError::Empty);
        }

        if let Some(c) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(RegionNameError::InvalidChar(c));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lower-case a region name and strip all whitespace.
///
/// Provider queries report display names ("West Europe"); callers pass
/// identifiers ("westeurope"). Both go through this before comparison.
pub fn normalize_region(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegionName {
    type Err = RegionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for RegionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RegionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
