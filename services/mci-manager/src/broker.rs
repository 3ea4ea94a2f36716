// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Typed client for the downstream cloud-abstraction broker.
//!
//! The broker is a sibling REST service that performs every
//! provider-touching operation. Request bodies are JSON objects of the
//! form `{ConnectionName, ReqInfo{…}}`; responses identify every entity
//! with an `IId{NameId, SystemId}` pair. That shape is preserved here and
//! nowhere else.
//!
//! Calls fall into three timeout classes: short (health and lookups),
//! medium (create/delete), and long (bounded by the caller; snapshots and
//! VPNs). There is no retry at this layer; retry policy belongs to the
//! caller.

use std::time::Duration;

use reqwest::{Client, Method};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mci_types::common::KeyValue;
use mci_types::conn::CredentialInfo;

/// Short class: health probes and cheap lookups.
pub const SHORT: Duration = Duration::from_secs(5);
/// Medium class: resource create/read/delete.
pub const MEDIUM: Duration = Duration::from_secs(60);

/// Opaque id-transform pass-through; the broker interprets it, we do not.
const ID_TRANSFORM_DEFAULT: &str = "ON";

/// Broker client errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("{message} (broker status {status})")]
    Api { status: u16, message: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BrokerError::Timeout(e.to_string())
        } else {
            BrokerError::Http(e)
        }
    }
}

/// The broker's error body shape.
#[derive(Debug, Deserialize)]
struct BrokerErrorBody {
    message: String,
}

// ============================================================================
// Wire shapes
// ============================================================================

/// The broker's dual identifier for every entity: the name we supplied
/// (`NameId`) and the CSP-native identifier (`SystemId`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct IId {
    pub name_id: String,
    pub system_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderConnectionRequest {
    pub connection_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderDriverInfo {
    pub provider_name: String,
    pub driver_name: String,
    pub driver_lib_file_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderRegionZoneInfo {
    pub provider_name: String,
    pub region_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_zone_list: Vec<String>,
    #[serde(default)]
    pub key_value_info_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpiderRegionList {
    #[serde(default)]
    pub region: Vec<SpiderRegionZoneInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderConnConfig {
    pub config_name: String,
    pub provider_name: String,
    pub driver_name: String,
    pub credential_name: String,
    pub region_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSubnetReqInfo {
    pub name: String,
    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderCreateVpcReqInfo {
    pub name: String,
    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,
    pub subnet_info_list: Vec<SpiderSubnetReqInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderCreateVpcRequest {
    pub connection_name: String,
    #[serde(rename = "IDTransformMode")]
    pub id_transform_mode: String,
    pub req_info: SpiderCreateVpcReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderRegisterVpcRequest {
    pub connection_name: String,
    pub req_info: SpiderRegisterVpcReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderRegisterVpcReqInfo {
    pub name: String,
    #[serde(rename = "CSPId")]
    pub csp_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderAddSubnetRequest {
    pub connection_name: String,
    #[serde(rename = "IDTransformMode")]
    pub id_transform_mode: String,
    pub req_info: SpiderSubnetReqInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSubnetInfo {
    pub i_id: IId,
    #[serde(rename = "IPv4_CIDR", default)]
    pub ipv4_cidr: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub tag_list: Vec<KeyValue>,
    #[serde(default)]
    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVpcInfo {
    pub i_id: IId,
    #[serde(rename = "IPv4_CIDR", default)]
    pub ipv4_cidr: String,
    #[serde(default)]
    pub subnet_info_list: Vec<SpiderSubnetInfo>,
    #[serde(default)]
    pub tag_list: Vec<KeyValue>,
    #[serde(default)]
    pub key_value_list: Vec<KeyValue>,
}

/// Boolean results arrive as `{Result: "true"}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderBooleanResult {
    pub result: String,
}

impl SpiderBooleanResult {
    pub fn is_true(&self) -> bool {
        self.result.trim().eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSecurityRule {
    pub direction: String,
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    #[serde(default)]
    pub from_port: String,
    #[serde(default)]
    pub to_port: String,
    #[serde(rename = "CIDR", default)]
    pub cidr: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSecurityGroupReqInfo {
    pub name: String,
    #[serde(rename = "VPCName")]
    pub vpc_name: String,
    pub security_rules: Vec<SpiderSecurityRule>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSecurityGroupRequest {
    pub connection_name: String,
    pub req_info: SpiderSecurityGroupReqInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSecurityGroupInfo {
    pub i_id: IId,
    #[serde(default)]
    pub security_rules: Vec<SpiderSecurityRule>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSecurityRulesRequest {
    pub connection_name: String,
    pub req_info: SpiderSecurityRulesReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderSecurityRulesReqInfo {
    pub rule_info_list: Vec<SpiderSecurityRule>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderKeyPairRequest {
    pub connection_name: String,
    pub req_info: SpiderKeyPairReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderKeyPairReqInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderKeyPairInfo {
    pub i_id: IId,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(rename = "VMUserId", default)]
    pub vm_user_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVmReqInfo {
    pub name: String,
    pub image_name: String,
    #[serde(rename = "VPCName")]
    pub vpc_name: String,
    pub subnet_name: String,
    pub security_group_names: Vec<String>,
    #[serde(rename = "VMSpecName")]
    pub vm_spec_name: String,
    pub key_pair_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_disk_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_disk_size: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVmRequest {
    pub connection_name: String,
    #[serde(rename = "IDTransformMode")]
    pub id_transform_mode: String,
    pub req_info: SpiderVmReqInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVmInfo {
    pub i_id: IId,
    #[serde(rename = "PublicIP", default)]
    pub public_ip: String,
    #[serde(rename = "PrivateIP", default)]
    pub private_ip: String,
    #[serde(rename = "VMSpecName", default)]
    pub vm_spec_name: String,
    #[serde(default)]
    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVmStatusInfo {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVmSpecInfo {
    pub name: String,
    #[serde(default)]
    pub v_cpu: SpiderVCpuInfo,
    /// Memory in MiB, as a string
    #[serde(default)]
    pub mem: String,
    #[serde(default)]
    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVCpuInfo {
    #[serde(default)]
    pub count: String,
    #[serde(default)]
    pub clock: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderImageInfo {
    pub i_id: IId,
    #[serde(rename = "GuestOS", default)]
    pub guest_os: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderDiskRequest {
    pub connection_name: String,
    pub req_info: SpiderDiskReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderDiskReqInfo {
    pub name: String,
    #[serde(default)]
    pub disk_type: String,
    #[serde(default)]
    pub disk_size: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderDiskInfo {
    pub i_id: IId,
    #[serde(default)]
    pub disk_type: String,
    #[serde(default)]
    pub disk_size: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderMyImageRequest {
    pub connection_name: String,
    pub req_info: SpiderMyImageReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderMyImageReqInfo {
    pub name: String,
    #[serde(rename = "SourceVM")]
    pub source_vm: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderMyImageInfo {
    pub i_id: IId,
    #[serde(rename = "SourceVM", default)]
    pub source_vm: String,
    #[serde(default)]
    pub status: String,
    /// Data disks captured with the snapshot
    #[serde(rename = "DataDiskIIdList", default)]
    pub data_disk_iid_list: Vec<IId>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderCommandRequest {
    pub connection_name: String,
    pub req_info: SpiderCommandReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderCommandReqInfo {
    #[serde(rename = "VMName")]
    pub vm_name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderCommandResult {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVpnRequest {
    pub connection_name: String,
    pub req_info: SpiderVpnReqInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVpnReqInfo {
    pub name: String,
    #[serde(rename = "LocalVPCName")]
    pub local_vpc_name: String,
    #[serde(rename = "PeerVPCName")]
    pub peer_vpc_name: String,
    pub peer_connection_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpiderVpnInfo {
    pub i_id: IId,
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Client
// ============================================================================

/// The broker client. Cheap to clone.
#[derive(Clone)]
pub struct BrokerClient {
    base_url: String,
    client: Client,
}

impl BrokerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One broker round trip: optional JSON body, per-call timeout,
    /// broker error body decoded on non-2xx.
    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<T, BrokerError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url).timeout(timeout);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<BrokerErrorBody>(&raw)
                .map(|b| b.message)
                .unwrap_or(raw);
            return Err(BrokerError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let raw = resp.text().await?;
        serde_json::from_str(&raw).map_err(|e| BrokerError::Decode(format!("{e}: {raw}")))
    }

    // ------------------------------------------------------------------
    // Health, catalog, credentials, connections
    // ------------------------------------------------------------------

    /// Broker liveness probe.
    pub async fn ready(&self) -> Result<(), BrokerError> {
        let _: serde_json::Value = self
            .call::<(), _>(Method::GET, "/readyz", None, SHORT)
            .await?;
        Ok(())
    }

    pub async fn register_driver(
        &self,
        driver: &SpiderDriverInfo,
    ) -> Result<SpiderDriverInfo, BrokerError> {
        self.call(Method::POST, "/driver", Some(driver), MEDIUM).await
    }

    pub async fn register_region(
        &self,
        region: &SpiderRegionZoneInfo,
    ) -> Result<SpiderRegionZoneInfo, BrokerError> {
        self.call(Method::POST, "/region", Some(region), MEDIUM).await
    }

    pub async fn list_regions(&self) -> Result<SpiderRegionList, BrokerError> {
        self.call::<(), _>(Method::GET, "/region", None, MEDIUM).await
    }

    pub async fn get_region(&self, name: &str) -> Result<SpiderRegionZoneInfo, BrokerError> {
        self.call::<(), _>(Method::GET, &format!("/region/{name}"), None, MEDIUM)
            .await
    }

    pub async fn register_credential(
        &self,
        credential: &CredentialInfo,
    ) -> Result<CredentialInfo, BrokerError> {
        self.call(Method::POST, "/credential", Some(credential), MEDIUM)
            .await
    }

    pub async fn register_connection(
        &self,
        config: &SpiderConnConfig,
    ) -> Result<SpiderConnConfig, BrokerError> {
        self.call(Method::POST, "/connectionconfig", Some(config), MEDIUM)
            .await
    }

    /// Reachability probe: list key pairs under a connection. Any 2xx
    /// counts as reachable.
    pub async fn check_connection(&self, connection_name: &str) -> Result<(), BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        let _: serde_json::Value = self
            .call(Method::GET, "/allkeypair", Some(&body), SHORT)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // VPC / subnet
    // ------------------------------------------------------------------

    pub async fn create_vpc(
        &self,
        connection_name: &str,
        req_info: SpiderCreateVpcReqInfo,
    ) -> Result<SpiderVpcInfo, BrokerError> {
        let body = SpiderCreateVpcRequest {
            connection_name: connection_name.to_string(),
            id_transform_mode: ID_TRANSFORM_DEFAULT.to_string(),
            req_info,
        };
        self.call(Method::POST, "/vpc", Some(&body), MEDIUM).await
    }

    pub async fn register_vpc(
        &self,
        connection_name: &str,
        name: &str,
        csp_id: &str,
    ) -> Result<SpiderVpcInfo, BrokerError> {
        let body = SpiderRegisterVpcRequest {
            connection_name: connection_name.to_string(),
            req_info: SpiderRegisterVpcReqInfo {
                name: name.to_string(),
                csp_id: csp_id.to_string(),
            },
        };
        self.call(Method::POST, "/regvpc", Some(&body), MEDIUM).await
    }

    pub async fn get_vpc(
        &self,
        connection_name: &str,
        vpc_name: &str,
    ) -> Result<SpiderVpcInfo, BrokerError> {
        let path = format!("/vpc/{vpc_name}?ConnectionName={connection_name}");
        self.call::<(), _>(Method::GET, &path, None, MEDIUM).await
    }

    pub async fn delete_vpc(
        &self,
        connection_name: &str,
        vpc_name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::DELETE, &format!("/vpc/{vpc_name}"), Some(&body), MEDIUM)
            .await
    }

    pub async fn deregister_vpc(
        &self,
        connection_name: &str,
        vpc_name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(
            Method::DELETE,
            &format!("/regvpc/{vpc_name}"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    pub async fn add_subnet(
        &self,
        connection_name: &str,
        vpc_name: &str,
        req_info: SpiderSubnetReqInfo,
    ) -> Result<SpiderVpcInfo, BrokerError> {
        let body = SpiderAddSubnetRequest {
            connection_name: connection_name.to_string(),
            id_transform_mode: ID_TRANSFORM_DEFAULT.to_string(),
            req_info,
        };
        self.call(
            Method::POST,
            &format!("/vpc/{vpc_name}/subnet"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    pub async fn remove_subnet(
        &self,
        connection_name: &str,
        vpc_name: &str,
        subnet_name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(
            Method::DELETE,
            &format!("/vpc/{vpc_name}/subnet/{subnet_name}"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Security groups
    // ------------------------------------------------------------------

    pub async fn create_security_group(
        &self,
        connection_name: &str,
        req_info: SpiderSecurityGroupReqInfo,
    ) -> Result<SpiderSecurityGroupInfo, BrokerError> {
        let body = SpiderSecurityGroupRequest {
            connection_name: connection_name.to_string(),
            req_info,
        };
        self.call(Method::POST, "/securitygroup", Some(&body), MEDIUM)
            .await
    }

    pub async fn delete_security_group(
        &self,
        connection_name: &str,
        sg_name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(
            Method::DELETE,
            &format!("/securitygroup/{sg_name}"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    pub async fn add_security_rules(
        &self,
        connection_name: &str,
        sg_name: &str,
        rules: Vec<SpiderSecurityRule>,
    ) -> Result<SpiderSecurityGroupInfo, BrokerError> {
        let body = SpiderSecurityRulesRequest {
            connection_name: connection_name.to_string(),
            req_info: SpiderSecurityRulesReqInfo {
                rule_info_list: rules,
            },
        };
        self.call(
            Method::POST,
            &format!("/securitygroup/{sg_name}/rules"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    pub async fn remove_security_rules(
        &self,
        connection_name: &str,
        sg_name: &str,
        rules: Vec<SpiderSecurityRule>,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderSecurityRulesRequest {
            connection_name: connection_name.to_string(),
            req_info: SpiderSecurityRulesReqInfo {
                rule_info_list: rules,
            },
        };
        self.call(
            Method::DELETE,
            &format!("/securitygroup/{sg_name}/rules"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Key pairs
    // ------------------------------------------------------------------

    pub async fn create_keypair(
        &self,
        connection_name: &str,
        name: &str,
    ) -> Result<SpiderKeyPairInfo, BrokerError> {
        let body = SpiderKeyPairRequest {
            connection_name: connection_name.to_string(),
            req_info: SpiderKeyPairReqInfo {
                name: name.to_string(),
            },
        };
        self.call(Method::POST, "/keypair", Some(&body), MEDIUM).await
    }

    pub async fn delete_keypair(
        &self,
        connection_name: &str,
        name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::DELETE, &format!("/keypair/{name}"), Some(&body), MEDIUM)
            .await
    }

    // ------------------------------------------------------------------
    // VMs
    // ------------------------------------------------------------------

    pub async fn create_vm(
        &self,
        connection_name: &str,
        req_info: SpiderVmReqInfo,
    ) -> Result<SpiderVmInfo, BrokerError> {
        let body = SpiderVmRequest {
            connection_name: connection_name.to_string(),
            id_transform_mode: ID_TRANSFORM_DEFAULT.to_string(),
            req_info,
        };
        self.call(Method::POST, "/vm", Some(&body), MEDIUM).await
    }

    pub async fn get_vm_status(
        &self,
        connection_name: &str,
        vm_name: &str,
    ) -> Result<SpiderVmStatusInfo, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::GET, &format!("/vmstatus/{vm_name}"), Some(&body), MEDIUM)
            .await
    }

    pub async fn control_vm(
        &self,
        connection_name: &str,
        vm_name: &str,
        action: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(
            Method::GET,
            &format!("/controlvm/{vm_name}?action={action}"),
            Some(&body),
            MEDIUM,
        )
        .await
    }

    pub async fn delete_vm(
        &self,
        connection_name: &str,
        vm_name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::DELETE, &format!("/vm/{vm_name}"), Some(&body), MEDIUM)
            .await
    }

    pub async fn run_command(
        &self,
        connection_name: &str,
        req_info: SpiderCommandReqInfo,
    ) -> Result<SpiderCommandResult, BrokerError> {
        let body = SpiderCommandRequest {
            connection_name: connection_name.to_string(),
            req_info,
        };
        self.call(Method::POST, "/vmcommand", Some(&body), MEDIUM).await
    }

    // ------------------------------------------------------------------
    // Specs, images, disks, snapshots
    // ------------------------------------------------------------------

    pub async fn list_vm_specs(
        &self,
        connection_name: &str,
    ) -> Result<Vec<SpiderVmSpecInfo>, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::GET, "/vmspec", Some(&body), MEDIUM).await
    }

    pub async fn list_vm_images(
        &self,
        connection_name: &str,
    ) -> Result<Vec<SpiderImageInfo>, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::GET, "/vmimage", Some(&body), MEDIUM).await
    }

    pub async fn create_disk(
        &self,
        connection_name: &str,
        req_info: SpiderDiskReqInfo,
    ) -> Result<SpiderDiskInfo, BrokerError> {
        let body = SpiderDiskRequest {
            connection_name: connection_name.to_string(),
            req_info,
        };
        self.call(Method::POST, "/disk", Some(&body), MEDIUM).await
    }

    pub async fn delete_disk(
        &self,
        connection_name: &str,
        name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::DELETE, &format!("/disk/{name}"), Some(&body), MEDIUM)
            .await
    }

    /// Snapshot a VM into a broker-side image. Long class; the deadline is
    /// supplied by the caller.
    pub async fn snapshot_vm(
        &self,
        connection_name: &str,
        req_info: SpiderMyImageReqInfo,
        timeout: Duration,
    ) -> Result<SpiderMyImageInfo, BrokerError> {
        let body = SpiderMyImageRequest {
            connection_name: connection_name.to_string(),
            req_info,
        };
        self.call(Method::POST, "/myimage", Some(&body), timeout).await
    }

    pub async fn delete_my_image(
        &self,
        connection_name: &str,
        name: &str,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::DELETE, &format!("/myimage/{name}"), Some(&body), MEDIUM)
            .await
    }

    // ------------------------------------------------------------------
    // Site-to-site VPN (long class)
    // ------------------------------------------------------------------

    pub async fn create_vpn(
        &self,
        connection_name: &str,
        req_info: SpiderVpnReqInfo,
        timeout: Duration,
    ) -> Result<SpiderVpnInfo, BrokerError> {
        let body = SpiderVpnRequest {
            connection_name: connection_name.to_string(),
            req_info,
        };
        self.call(Method::POST, "/vpn", Some(&body), timeout).await
    }

    pub async fn update_vpn(
        &self,
        connection_name: &str,
        req_info: SpiderVpnReqInfo,
        timeout: Duration,
    ) -> Result<SpiderVpnInfo, BrokerError> {
        let body = SpiderVpnRequest {
            connection_name: connection_name.to_string(),
            req_info,
        };
        let name = body.req_info.name.clone();
        self.call(Method::PUT, &format!("/vpn/{name}"), Some(&body), timeout)
            .await
    }

    pub async fn delete_vpn(
        &self,
        connection_name: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<SpiderBooleanResult, BrokerError> {
        let body = SpiderConnectionRequest {
            connection_name: connection_name.to_string(),
        };
        self.call(Method::DELETE, &format!("/vpn/{name}"), Some(&body), timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vpc_request_matches_broker_shape() {
        let body = SpiderCreateVpcRequest {
            connection_name: "aws-us-east-1".into(),
            id_transform_mode: "ON".into(),
            req_info: SpiderCreateVpcReqInfo {
                name: "uuid-1".into(),
                ipv4_cidr: "10.0.0.0/16".into(),
                subnet_info_list: vec![SpiderSubnetReqInfo {
                    name: "uuid-2".into(),
                    ipv4_cidr: "10.0.1.0/24".into(),
                    zone: "us-east-1a".into(),
                    tag_list: vec![],
                }],
                tag_list: vec![],
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ConnectionName"], "aws-us-east-1");
        assert_eq!(json["IDTransformMode"], "ON");
        assert_eq!(json["ReqInfo"]["IPv4_CIDR"], "10.0.0.0/16");
        assert_eq!(json["ReqInfo"]["SubnetInfoList"][0]["Name"], "uuid-2");
    }

    #[test]
    fn vpc_response_decodes_iids() {
        let raw = r#"{
            "IId": {"NameId": "uuid-1", "SystemId": "vpc-1234"},
            "IPv4_CIDR": "10.0.0.0/16",
            "SubnetInfoList": [
                {"IId": {"NameId": "uuid-2", "SystemId": "subnet-9"}, "IPv4_CIDR": "10.0.1.0/24", "Zone": "us-east-1a"}
            ]
        }"#;
        let info: SpiderVpcInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.i_id.system_id, "vpc-1234");
        assert_eq!(info.subnet_info_list[0].i_id.name_id, "uuid-2");
        assert_eq!(info.subnet_info_list[0].zone, "us-east-1a");
    }

    #[test]
    fn boolean_result_parses_loosely() {
        assert!(SpiderBooleanResult {
            result: "true".into()
        }
        .is_true());
        assert!(SpiderBooleanResult {
            result: " True ".into()
        }
        .is_true());
        assert!(!SpiderBooleanResult {
            result: "false".into()
        }
        .is_true());
    }
}
