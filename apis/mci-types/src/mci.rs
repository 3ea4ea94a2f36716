// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Multi-cloud infrastructure (MCI) types: compound infrastructures, their
//! VMs and subgroups, remote commands, bastion wiring, policies, and VPNs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::KeyValue;
use crate::net::{CustomImageInfo, DataDiskInfo};

// ============================================================================
// Dynamic creation
// ============================================================================

/// One VM template in a dynamic MCI request. Every template expands into a
/// subgroup of `subGroupSize` VMs created from the same spec and image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmDynamicReq {
    /// Subgroup name; VM ids derive from it (`<name>-1`, `<name>-2`, …)
    pub name: String,
    /// Cached spec id to create the VMs from
    pub spec_id: String,
    /// Cached image id to boot the VMs from
    pub image_id: String,
    /// Connection to dispatch on; defaults to the spec's connection
    #[serde(default)]
    pub connection_name: String,
    #[serde(default = "default_sub_group_size")]
    pub sub_group_size: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub root_disk_type: String,
    #[serde(default)]
    pub root_disk_size: String,
}

fn default_sub_group_size() -> u32 {
    1
}

/// Request body for creating an MCI from VM templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MciDynamicReq {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub vm: Vec<VmDynamicReq>,
}

/// Request body for scaling out a subgroup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleOutReq {
    /// Number of VMs to add
    pub number_of_added_vm: u32,
}

// ============================================================================
// Entities
// ============================================================================

/// A VM inside an MCI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct VmInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub connection_name: String,
    /// Lifecycle or broker-reported runtime state
    pub status: String,
    #[serde(default)]
    pub csp_vm_id: String,
    #[serde(default)]
    pub csp_vm_name: String,
    #[serde(rename = "PublicIP", default)]
    pub public_ip: String,
    #[serde(rename = "PrivateIP", default)]
    pub private_ip: String,
    #[serde(default)]
    pub sg_ids: Vec<String>,
    #[serde(default)]
    pub v_net_id: String,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub ssh_key_id: String,
    #[serde(default)]
    pub image_id: String,
    #[serde(default)]
    pub spec_id: String,
    #[serde(default)]
    pub data_disk_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_group_id: String,
    /// Bastion VM this VM is reached through, when set
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bastion_ref: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_value_list: Vec<KeyValue>,
}

/// A subgroup: the VMs created from one dynamic template, and the template
/// itself so scale-out can replay it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SubGroupInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub sub_group_size: u32,
    pub vm_id_list: Vec<String>,
    /// Template replayed on scale-out
    pub template: VmDynamicReq,
}

/// A multi-cloud infrastructure: a set of VMs managed as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct MciInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub vm_list: Vec<VmInfo>,
    #[serde(default)]
    pub sub_group_list: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub associated_policy_id: String,
}

// ============================================================================
// Control, commands, bastion
// ============================================================================

/// Actions accepted by the MCI/VM control endpoints.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ControlAction {
    Suspend,
    Resume,
    Reboot,
    Terminate,
}

/// Request body for remote command fan-out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MciCmdReq {
    pub command: Vec<String>,
    #[serde(default)]
    pub user_name: String,
}

/// Per-VM result of a fan-out operation. A failed item carries its own
/// error without failing the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmFanoutResult {
    pub vm_id: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Aggregated fan-out response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MciFanoutResponse {
    pub results: Vec<VmFanoutResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<VmFanoutResult>,
}

/// Bastion lookup response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BastionInfo {
    #[serde(default)]
    pub bastion_vm_id: String,
}

// ============================================================================
// Snapshots
// ============================================================================

/// Request body for snapshotting a VM.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmSnapshotReq {
    pub name: String,
}

/// Result of a VM snapshot: one custom image plus the captured data disks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VmSnapshotResult {
    pub custom_image: CustomImageInfo,
    #[serde(default)]
    pub data_disks: Vec<DataDiskInfo>,
}

// ============================================================================
// Policies and VPN
// ============================================================================

/// An autoscaling policy. The body is stored verbatim and consumed by an
/// external evaluation loop; the manager never interprets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MciPolicyInfo {
    pub mci_id: String,
    pub policy: serde_json::Value,
}

/// One endpoint of a site-to-site VPN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpnSite {
    pub connection_name: String,
    pub v_net_id: String,
    #[serde(default)]
    pub cidr: String,
}

/// Request body for creating or updating a site-to-site VPN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpnReq {
    pub name: String,
    pub site1: VpnSite,
    pub site2: VpnSite,
}

/// A site-to-site VPN. Long-running operations return a request id
/// immediately; progress is polled per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpnInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub status: String,
    pub site1: VpnSite,
    pub site2: VpnSite,
    /// Request id of the most recent long-running operation
    #[serde(default)]
    pub request_id: String,
}

/// Immediate acknowledgement of a long-running VPN operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpnRequestAck {
    pub vpn_id: String,
    pub request_id: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn vm_info_wire_shape() {
        let vm = VmInfo {
            id: "g1-1".into(),
            uuid: "u".into(),
            name: "g1-1".into(),
            connection_name: "aws-us-east-1".into(),
            status: "Running".into(),
            public_ip: "54.1.2.3".into(),
            sub_group_id: "g1".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&vm).unwrap();
        assert_eq!(json["PublicIP"], "54.1.2.3");
        assert_eq!(json["SubGroupId"], "g1");
        // empty bastion ref is omitted entirely
        assert!(json.get("BastionRef").is_none());
    }

    #[test]
    fn control_action_parses() {
        assert_eq!(
            ControlAction::from_str("suspend").unwrap(),
            ControlAction::Suspend
        );
        assert_eq!(ControlAction::Terminate.to_string(), "terminate");
        assert!(ControlAction::from_str("defenestrate").is_err());
    }

    #[test]
    fn bastion_info_uses_camel_case() {
        let info = BastionInfo {
            bastion_vm_id: "bast1".into(),
        };
        assert_eq!(
            serde_json::to_string(&info).unwrap(),
            r#"{"bastionVmId":"bast1"}"#
        );
    }

    #[test]
    fn dynamic_req_defaults_group_size() {
        let req: VmDynamicReq = serde_json::from_str(
            r#"{"name":"g1","specId":"aws-us-east-1-t3-large","imageId":"img"}"#,
        )
        .unwrap();
        assert_eq!(req.sub_group_size, 1);
    }
}
