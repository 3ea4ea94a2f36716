// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! The static provider/region catalog and the Kubernetes offering catalog.
//!
//! Both are loaded once from YAML assets at startup and are read-only
//! afterwards.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Details of a single region of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RegionDetail {
    /// The CSP-native region identifier (e.g. `us-east-1`)
    pub region_id: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub description: String,
    /// Zones declared for this region; subnets may only pin one of these
    #[serde(default)]
    pub zones: Vec<String>,
}

/// A provider entry in the cloud catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDetail {
    /// Driver library name pushed to the broker
    pub driver: String,
    #[serde(default)]
    pub description: String,
    /// Region name → details; keys are compared case-insensitively
    #[serde(default)]
    pub regions: BTreeMap<String, RegionDetail>,
}

/// The immutable provider/region catalog read at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudCatalog {
    pub csps: BTreeMap<String, ProviderDetail>,
}

impl CloudCatalog {
    /// Parse a catalog from its YAML asset form.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Look up a provider, case-insensitively.
    pub fn provider(&self, provider_name: &str) -> Option<&ProviderDetail> {
        self.csps
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider_name))
            .map(|(_, detail)| detail)
    }

    /// Look up region details for a provider/region pair, case-insensitively.
    pub fn region(&self, provider_name: &str, region_name: &str) -> Option<&RegionDetail> {
        self.provider(provider_name)?
            .regions
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(region_name))
            .map(|(_, detail)| detail)
    }

    /// All provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        self.csps.keys().cloned().collect()
    }
}

// ============================================================================
// Kubernetes offering catalog
// ============================================================================

/// One available version or node image entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct K8sAvailableItem {
    pub name: String,
    #[serde(default)]
    pub id: String,
}

/// Availability of versions or node images for a set of regions.
///
/// The region list may contain the sentinel `common`, matching any region
/// that has no entry of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct K8sRegionalAvailability {
    pub region: Vec<String>,
    #[serde(default)]
    pub available: Vec<K8sAvailableItem>,
}

/// Kubernetes offering details for one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct K8sClusterDetail {
    /// Whether node groups must be supplied at cluster creation
    #[serde(default)]
    pub node_groups_on_creation: bool,
    #[serde(default)]
    pub version: Vec<K8sRegionalAvailability>,
    #[serde(default)]
    pub node_image: Vec<K8sRegionalAvailability>,
}

/// The Kubernetes offering catalog, keyed by provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct K8sCatalog {
    pub csps: BTreeMap<String, K8sClusterDetail>,
}

/// Region sentinel matching any region without a dedicated entry.
pub const K8S_COMMON_REGION: &str = "common";

impl K8sCatalog {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn provider(&self, provider_name: &str) -> Option<&K8sClusterDetail> {
        self.csps
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider_name))
            .map(|(_, detail)| detail)
    }
}

/// Select the availability entry for a region, falling back to `common`.
pub fn regional_availability<'a>(
    entries: &'a [K8sRegionalAvailability],
    region_name: &str,
) -> Option<&'a K8sRegionalAvailability> {
    entries
        .iter()
        .find(|e| e.region.iter().any(|r| r.eq_ignore_ascii_case(region_name)))
        .or_else(|| {
            entries
                .iter()
                .find(|e| e.region.iter().any(|r| r.eq_ignore_ascii_case(K8S_COMMON_REGION)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
csps:
  aws:
    driver: aws-driver-v1.0.so
    regions:
      us-east-1:
        RegionId: us-east-1
        Zones: [us-east-1a, us-east-1b]
      us-west-2:
        RegionId: us-west-2
        Zones: [us-west-2a, us-west-2b]
  gcp:
    driver: gcp-driver-v1.0.so
    regions:
      us-central1:
        RegionId: us-central1
        Zones: [us-central1-a]
"#;

    #[test]
    fn parse_and_lookup() {
        let catalog = CloudCatalog::from_yaml(CATALOG).unwrap();
        assert_eq!(catalog.provider_names(), vec!["aws", "gcp"]);

        let region = catalog.region("AWS", "US-EAST-1").unwrap();
        assert_eq!(region.region_id, "us-east-1");
        assert_eq!(region.zones, vec!["us-east-1a", "us-east-1b"]);

        assert!(catalog.region("aws", "mars-north-1").is_none());
        assert!(catalog.provider("azure").is_none());
    }

    #[test]
    fn k8s_regional_fallback_to_common() {
        let entries = vec![
            K8sRegionalAvailability {
                region: vec!["us-east-1".into()],
                available: vec![K8sAvailableItem {
                    name: "1.32".into(),
                    id: String::new(),
                }],
            },
            K8sRegionalAvailability {
                region: vec!["common".into()],
                available: vec![K8sAvailableItem {
                    name: "1.30".into(),
                    id: String::new(),
                }],
            },
        ];
        assert_eq!(
            regional_availability(&entries, "us-east-1").unwrap().available[0].name,
            "1.32"
        );
        assert_eq!(
            regional_availability(&entries, "eu-west-3").unwrap().available[0].name,
            "1.30"
        );
    }
}
