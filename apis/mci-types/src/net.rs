// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Namespaced infrastructure resources: virtual networks and subnets,
//! security groups, SSH keys, specs, images, and data disks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{KeyValue, ResourceStatus};

// ============================================================================
// Virtual networks
// ============================================================================

/// Request body for declaring a subnet inside a vNet creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetReq {
    pub name: String,
    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,
    /// Optional zone pin; must be one of the region's declared zones
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_list: Vec<KeyValue>,
}

/// Request body for creating a vNet. At least one subnet is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct VNetReq {
    pub name: String,
    pub connection_name: String,
    pub cidr_block: String,
    #[serde(default)]
    pub description: String,
    pub subnet_info_list: Vec<SubnetReq>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_list: Vec<KeyValue>,
}

/// Request body for adopting a pre-existing CSP vNet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterVNetReq {
    pub name: String,
    pub connection_name: String,
    /// CSP-native identifier of the vNet to adopt
    pub csp_v_net_id: String,
    #[serde(default)]
    pub description: String,
}

/// A subnet of a vNet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub connection_name: String,
    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,
    #[serde(default)]
    pub zone: String,
    pub status: ResourceStatus,
    /// CSP identifiers of the owning vNet; must match the parent's
    #[serde(default)]
    pub csp_v_net_id: String,
    #[serde(default)]
    pub csp_v_net_name: String,
    #[serde(default)]
    pub csp_subnet_id: String,
    #[serde(default)]
    pub csp_subnet_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_list: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_value_list: Vec<KeyValue>,
}

/// A virtual network and its subnets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct VNetInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    #[serde(default)]
    pub cidr_block: String,
    #[serde(default)]
    pub description: String,
    pub status: ResourceStatus,
    #[serde(default)]
    pub csp_v_net_id: String,
    #[serde(default)]
    pub csp_v_net_name: String,
    #[serde(default)]
    pub subnet_info_list: Vec<SubnetInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_list: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_value_list: Vec<KeyValue>,
    /// Set on adopted resources to record their origin
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_label: String,
}

// ============================================================================
// Security groups
// ============================================================================

/// One firewall rule. Rules are matched for removal on the full
/// (direction, protocol, from, to, cidr) tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallRule {
    /// `inbound` or `outbound`
    pub direction: String,
    /// `tcp`, `udp`, `icmp`, or `all`
    pub protocol: String,
    #[serde(default)]
    pub from_port: String,
    #[serde(default)]
    pub to_port: String,
    #[serde(default)]
    pub cidr: String,
}

/// Request body for creating a security group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupReq {
    pub name: String,
    pub connection_name: String,
    pub v_net_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub firewall_rules: Vec<FirewallRule>,
}

/// A security group with its effective rule list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    pub v_net_id: String,
    #[serde(default)]
    pub description: String,
    pub status: ResourceStatus,
    #[serde(default)]
    pub csp_security_group_id: String,
    #[serde(default)]
    pub csp_security_group_name: String,
    #[serde(default)]
    pub firewall_rules: Vec<FirewallRule>,
}

/// Body for appending or removing firewall rules on a security group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallRulesReq {
    pub firewall_rules: Vec<FirewallRule>,
}

// ============================================================================
// SSH keys
// ============================================================================

/// Request body for creating an SSH key pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SshKeyReq {
    pub name: String,
    pub connection_name: String,
    #[serde(default)]
    pub description: String,
}

/// An SSH key pair. The private key is returned once at creation and kept
/// in the store for command dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SshKeyInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    #[serde(default)]
    pub description: String,
    pub status: ResourceStatus,
    #[serde(default)]
    pub csp_ssh_key_id: String,
    #[serde(default)]
    pub csp_ssh_key_name: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub username: String,
}

// ============================================================================
// Specs and images
// ============================================================================

/// A VM spec, cached from broker lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub region_name: String,
    /// CSP-native spec name (e.g. `t3.large`)
    pub csp_spec_name: String,
    #[serde(rename = "vCPU", default)]
    pub v_cpu: u32,
    #[serde(rename = "memoryGiB", default)]
    pub memory_gib: f32,
    #[serde(default)]
    pub cost_per_hour: f32,
}

/// One numeric range predicate; either bound may be omitted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
}

impl NumericRange {
    /// Whether a value satisfies the range (unset bounds always match).
    pub fn contains(&self, value: f32) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Range predicates for filtering cached specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpecsByRangeReq {
    #[serde(rename = "vCPU", default)]
    pub v_cpu: Option<NumericRange>,
    #[serde(rename = "memoryGiB", default)]
    pub memory_gib: Option<NumericRange>,
    #[serde(default)]
    pub cost_per_hour: Option<NumericRange>,
}

/// A machine image, cached from broker lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    pub csp_image_id: String,
    #[serde(default)]
    pub csp_image_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub guest_os: String,
    pub status: ResourceStatus,
}

/// A custom image created from a VM snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomImageInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    pub csp_custom_image_id: String,
    #[serde(default)]
    pub csp_custom_image_name: String,
    /// The VM this image was snapshotted from
    #[serde(default)]
    pub source_vm_id: String,
    /// Spec of the source VM, carried for later re-creation
    #[serde(default)]
    pub source_vm_spec_id: String,
    #[serde(default)]
    pub description: String,
    pub status: ResourceStatus,
}

/// Request body for fetching specs or images from the broker into the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchReq {
    pub connection_name: String,
}

// ============================================================================
// Data disks
// ============================================================================

/// Request body for creating a data disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DataDiskReq {
    pub name: String,
    pub connection_name: String,
    #[serde(default)]
    pub disk_type: String,
    /// Size in GiB, as the broker expects it
    #[serde(default)]
    pub disk_size: String,
    #[serde(default)]
    pub description: String,
}

/// A data disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DataDiskInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    #[serde(default)]
    pub disk_type: String,
    #[serde(default)]
    pub disk_size: String,
    #[serde(default)]
    pub description: String,
    pub status: ResourceStatus,
    #[serde(default)]
    pub csp_data_disk_id: String,
    #[serde(default)]
    pub csp_data_disk_name: String,
    /// VMs this disk is attached to
    #[serde(default)]
    pub associated_object_list: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vnet_req_wire_shape() {
        let req = VNetReq {
            name: "vnet1".into(),
            connection_name: "aws-us-east-1".into(),
            cidr_block: "10.0.0.0/16".into(),
            subnet_info_list: vec![SubnetReq {
                name: "sn1".into(),
                ipv4_cidr: "10.0.1.0/24".into(),
                zone: "us-east-1a".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["CidrBlock"], "10.0.0.0/16");
        assert_eq!(json["SubnetInfoList"][0]["IPv4_CIDR"], "10.0.1.0/24");
        assert_eq!(json["SubnetInfoList"][0]["Zone"], "us-east-1a");
    }

    #[test]
    fn vnet_info_round_trips() {
        let info = VNetInfo {
            id: "vnet1".into(),
            uuid: "u-1".into(),
            name: "vnet1".into(),
            connection_name: "aws-us-east-1".into(),
            cidr_block: "10.0.0.0/16".into(),
            status: ResourceStatus::InUse,
            csp_v_net_id: "vpc-1234".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: VNetInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.csp_v_net_id, "vpc-1234");
        assert_eq!(back.status, ResourceStatus::InUse);
        assert!(json.contains(r#""CspVNetId":"vpc-1234""#));
        assert!(json.contains(r#""Status":"InUse""#));
    }

    #[test]
    fn numeric_range_bounds() {
        let r = NumericRange {
            min: Some(2.0),
            max: Some(8.0),
        };
        assert!(r.contains(2.0));
        assert!(r.contains(8.0));
        assert!(!r.contains(1.5));
        assert!(!r.contains(8.5));
        assert!(NumericRange::default().contains(123.0));
    }

    #[test]
    fn firewall_rule_match_tuple_equality() {
        let a = FirewallRule {
            direction: "inbound".into(),
            protocol: "tcp".into(),
            from_port: "22".into(),
            to_port: "22".into(),
            cidr: "0.0.0.0/0".into(),
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.to_port = "23".into();
        assert_ne!(a, b);
    }
}
