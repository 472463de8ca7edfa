// ABOUTME: Azure resource group name validation.
// ABOUTME: Enforces the length and character rules Azure applies to resource groups.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_LEN: usize = 90;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceGroupNameError {
    #[error("resource group name cannot be empty")]
    Empty,

    #[error("resource group name exceeds maximum length of 90 characters")]
    TooLong,

    #[error("resource group name cannot end with a period")]
    EndsWithPeriod,

    #[error("invalid character in resource group name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupName(String);

impl ResourceGroupName {
    pub fn new(value: &str) -> Result<Self, ResourceGroupNameError> {
        if value.is_empty() {
            return Err(ResourceGroupNameError::Empty);
        }

        if value.chars().count() > MAX_LEN {
            return Err(ResourceGroupNameError::TooLong);
        }

        if value.ends_with('.') {
            return Err(ResourceGroupNameError::EndsWithPeriod);
        }

        for c in value.chars() {
            if !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')')) {
                return Err(ResourceGroupNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceGroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceGroupName {
    type Err = ResourceGroupNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ResourceGroupName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceGroupName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
