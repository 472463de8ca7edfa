// ABOUTME: Static capability data: known-good regions and provider namespaces.
// ABOUTME: Read-only process-wide tables consulted by the resolver.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Regions verified to support the full platform service set.
pub const KNOWN_GOOD_REGIONS: &[&str] = &[
    "eastus",
    "eastus2",
    "westus2",
    "westus3",
    "centralus",
    "northeurope",
    "westeurope",
    "uksouth",
    "swedencentral",
    "southeastasia",
    "japaneast",
    "australiaeast",
];

const PROVIDER_NAMESPACES: &[(&str, &str)] = &[
    ("storage", "Microsoft.Storage"),
    ("keyvault", "Microsoft.KeyVault"),
    ("compute", "Microsoft.Compute"),
    ("network", "Microsoft.Network"),
    ("monitoring", "Microsoft.Insights"),
    ("loganalytics", "Microsoft.OperationalInsights"),
    ("containerregistry", "Microsoft.ContainerRegistry"),
    ("containerapps", "Microsoft.App"),
    ("kubernetes", "Microsoft.ContainerService"),
    ("functions", "Microsoft.Web"),
    ("appservice", "Microsoft.Web"),
    ("cosmosdb", "Microsoft.DocumentDB"),
    ("sql", "Microsoft.Sql"),
    ("servicebus", "Microsoft.ServiceBus"),
    ("eventhub", "Microsoft.EventHub"),
    ("machinelearning", "Microsoft.MachineLearningServices"),
    ("cognitiveservices", "Microsoft.CognitiveServices"),
    ("openai", "Microsoft.CognitiveServices"),
    ("search", "Microsoft.Search"),
];

/// Resource provider namespace backing a capability name, if known.
pub fn provider_namespace(capability: &str) -> Option<&'static str> {
    let capability = capability.trim().to_lowercase();
    PROVIDER_NAMESPACES
        .iter()
        .find(|(name, _)| *name == capability)
        .map(|(_, namespace)| *namespace)
}

pub(crate) fn is_known_good(region: &str) -> bool {
    KNOWN_GOOD_REGIONS.contains(&region)
}

/// Capability name to availability for one region.
pub type RegionCapabilityMap = BTreeMap<String, bool>;

/// Presentation form of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    Available,
    NotConfirmed,
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available {
            Availability::Available
        } else {
            Availability::NotConfirmed
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => f.write_str("Available"),
            Availability::NotConfirmed => f.write_str("Not confirmed"),
        }
    }
}
