// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Dropshot API trait for the multi-cloud infrastructure manager.
//!
//! The manager exposes a uniform REST API over many cloud providers. It
//! decomposes logical entities (namespaces, vNets with subnets, MCIs with
//! VMs and subgroups) into per-connection operations against a downstream
//! cloud-abstraction broker and reconciles the results into a durable
//! model.
//!
//! Route families, all under the `/tumblebug` prefix:
//!
//! - system probes (`/readyz`, `/httpVersion`)
//! - namespaces (`/ns…`)
//! - provider catalog and connections (`/provider`, `/connConfig…`)
//! - credential registration (`/credential…`)
//! - labels and label selection (`/label…`, `/resources/{labelType}`)
//! - namespaced resources (`/ns/{nsId}/resources/…`)
//! - MCIs and their VMs (`/ns/{nsId}/mci…`, `/ns/{nsId}/cmd/…`)
//! - request tracking (`/request…`, `/requests`)
//! - raw object browsing (`/object`, `/objects`)

use dropshot::{HttpError, HttpResponseOk, Path, Query, RequestContext, TypedBody};
use schemars::JsonSchema;
use serde::Deserialize;

use mci_types::catalog::{CloudCatalog, K8sAvailableItem, RegionDetail};
use mci_types::common::{IdList, NsInfo, NsReq, SimpleMsg};
use mci_types::conn::{ConnConfig, ConnConfigList, CredentialInfo, CredentialReq, PublicKeyResponse};
use mci_types::mci::{
    BastionInfo, ControlAction, MciCmdReq, MciDynamicReq, MciFanoutResponse, MciInfo,
    MciPolicyInfo, ScaleOutReq, SubGroupInfo, VmInfo, VmSnapshotReq, VmSnapshotResult, VpnInfo,
    VpnReq, VpnRequestAck,
};
use mci_types::net::{
    DataDiskInfo, DataDiskReq, FetchReq, FilterSpecsByRangeReq, FirewallRulesReq, CustomImageInfo,
    ImageInfo, RegisterVNetReq, SecurityGroupInfo, SecurityGroupReq, SpecInfo, SshKeyInfo,
    SshKeyReq, SubnetInfo, SubnetReq, VNetInfo, VNetReq,
};
use mci_types::request::{RequestList, RequestRecord};

// ============================================================================
// Path parameters
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NsPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NsResourcePath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "resourceId")]
    pub resource_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubnetPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "resourceId")]
    pub resource_id: String,
    #[serde(rename = "subnetId")]
    pub subnet_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConnConfigPath {
    #[serde(rename = "connConfigName")]
    pub conn_config_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProviderRegionPath {
    #[serde(rename = "providerName")]
    pub provider_name: String,
    #[serde(rename = "regionName")]
    pub region_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LabelTypePath {
    #[serde(rename = "labelType")]
    pub label_type: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LabelPath {
    #[serde(rename = "labelType")]
    pub label_type: String,
    pub uid: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LabelKeyPath {
    #[serde(rename = "labelType")]
    pub label_type: String,
    pub uid: String,
    pub key: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReqIdPath {
    #[serde(rename = "reqId")]
    pub req_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MciPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubGroupPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    #[serde(rename = "subgroupId")]
    pub subgroup_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VmPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    #[serde(rename = "vmId")]
    pub vm_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BastionSetPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    /// The VM reached through the bastion
    #[serde(rename = "vmId")]
    pub vm_id: String,
    #[serde(rename = "bastionVmId")]
    pub bastion_vm_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BastionTargetPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    /// The VM reached through the bastion
    #[serde(rename = "vmId")]
    pub vm_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BastionPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    #[serde(rename = "bastionVmId")]
    pub bastion_vm_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VpnPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    #[serde(rename = "vpnId")]
    pub vpn_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VpnRequestPath {
    #[serde(rename = "nsId")]
    pub ns_id: String,
    #[serde(rename = "mciId")]
    pub mci_id: String,
    #[serde(rename = "vpnId")]
    pub vpn_id: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

// ============================================================================
// Query parameters
// ============================================================================

/// Filters for connection listing; all are optional and combinable.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ConnConfigFilterQuery {
    #[serde(rename = "filterCredentialHolder")]
    pub filter_credential_holder: Option<String>,
    #[serde(rename = "filterVerified")]
    pub filter_verified: Option<bool>,
    #[serde(rename = "filterRegionRepresentative")]
    pub filter_region_representative: Option<bool>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct WithSubnetsQuery {
    #[serde(rename = "withSubnets")]
    pub with_subnets: Option<bool>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LabelSelectorQuery {
    #[serde(rename = "labelSelector")]
    pub label_selector: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct KeyQuery {
    pub key: String,
}

/// Read options for an MCI; `option=status` triggers a live status fan-out.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct MciGetQuery {
    pub option: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ControlQuery {
    pub action: ControlAction,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ForceQuery {
    pub force: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct K8sAvailabilityQuery {
    #[serde(rename = "providerName")]
    pub provider_name: String,
    #[serde(rename = "regionName")]
    pub region_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct K8sProviderQuery {
    #[serde(rename = "providerName")]
    pub provider_name: String,
}

// ============================================================================
// Small response bodies
// ============================================================================

/// Existence probe response.
#[derive(Debug, serde::Serialize, Deserialize, JsonSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Results of a label selector query, materialized from the store.
#[derive(Debug, Default, serde::Serialize, Deserialize, JsonSchema)]
pub struct ResourcesResponse {
    pub results: Vec<serde_json::Value>,
}

/// Liveness response.
#[derive(Debug, serde::Serialize, Deserialize, JsonSchema)]
pub struct ReadyzResponse {
    pub message: String,
}

// ============================================================================
// The API
// ============================================================================

/// Multi-Cloud Infrastructure Manager API
#[dropshot::api_description]
pub trait MciManagerApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    /// Liveness probe. Reports ready only after all routes are installed.
    /// Skips authentication.
    #[endpoint {
        method = GET,
        path = "/tumblebug/readyz",
        tags = ["system"],
    }]
    async fn readyz(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ReadyzResponse>, HttpError>;

    /// Report the HTTP protocol version the request arrived on.
    #[endpoint {
        method = GET,
        path = "/tumblebug/httpVersion",
        tags = ["system"],
    }]
    async fn http_version(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------

    /// Create a namespace.
    ///
    /// Returns 409 when a namespace with the same id already exists.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns",
        tags = ["namespace"],
    }]
    async fn post_ns(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<NsReq>,
    ) -> Result<HttpResponseOk<NsInfo>, HttpError>;

    /// List namespace ids.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns",
        tags = ["namespace"],
    }]
    async fn list_ns(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Get a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}",
        tags = ["namespace"],
    }]
    async fn get_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<NsInfo>, HttpError>;

    /// Update a namespace's description.
    #[endpoint {
        method = PUT,
        path = "/tumblebug/ns/{nsId}",
        tags = ["namespace"],
    }]
    async fn put_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<NsReq>,
    ) -> Result<HttpResponseOk<NsInfo>, HttpError>;

    /// Delete a namespace.
    ///
    /// Returns 409 while the namespace still owns any resource or MCI.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}",
        tags = ["namespace"],
    }]
    async fn del_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Check whether a namespace exists.
    #[endpoint {
        method = GET,
        path = "/tumblebug/checkNs/{nsId}",
        tags = ["namespace"],
    }]
    async fn check_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<ExistsResponse>, HttpError>;

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// List the providers known to the static catalog.
    #[endpoint {
        method = GET,
        path = "/tumblebug/provider",
        tags = ["catalog"],
    }]
    async fn list_providers(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Get catalog details for one region of a provider.
    #[endpoint {
        method = GET,
        path = "/tumblebug/provider/{providerName}/region/{regionName}",
        tags = ["catalog"],
    }]
    async fn get_region(
        rqctx: RequestContext<Self::Context>,
        path: Path<ProviderRegionPath>,
    ) -> Result<HttpResponseOk<RegionDetail>, HttpError>;

    /// Dump the full cloud catalog.
    #[endpoint {
        method = GET,
        path = "/tumblebug/cloudInfo",
        tags = ["catalog"],
    }]
    async fn get_cloud_info(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<CloudCatalog>, HttpError>;

    /// List the Kubernetes cluster versions available for a provider/region.
    #[endpoint {
        method = GET,
        path = "/tumblebug/availableK8sClusterVersion",
        tags = ["catalog"],
    }]
    async fn available_k8s_cluster_version(
        rqctx: RequestContext<Self::Context>,
        query: Query<K8sAvailabilityQuery>,
    ) -> Result<HttpResponseOk<Vec<K8sAvailableItem>>, HttpError>;

    /// List the Kubernetes node images available for a provider/region.
    #[endpoint {
        method = GET,
        path = "/tumblebug/availableK8sClusterNodeImage",
        tags = ["catalog"],
    }]
    async fn available_k8s_cluster_node_image(
        rqctx: RequestContext<Self::Context>,
        query: Query<K8sAvailabilityQuery>,
    ) -> Result<HttpResponseOk<Vec<K8sAvailableItem>>, HttpError>;

    /// Whether node groups must be supplied when creating a cluster on the
    /// given provider.
    #[endpoint {
        method = GET,
        path = "/tumblebug/checkNodeGroupsOnK8sCreation",
        tags = ["catalog"],
    }]
    async fn check_node_groups_on_k8s_creation(
        rqctx: RequestContext<Self::Context>,
        query: Query<K8sProviderQuery>,
    ) -> Result<HttpResponseOk<ExistsResponse>, HttpError>;

    // ------------------------------------------------------------------
    // Credentials and connections
    // ------------------------------------------------------------------

    /// Issue an RSA public key for credential encryption.
    ///
    /// The returned token identifies the matching private key; it is
    /// consumed by the next credential registration that presents it,
    /// successful or not.
    #[endpoint {
        method = GET,
        path = "/tumblebug/credential/publicKey",
        tags = ["credential"],
    }]
    async fn get_public_key(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<PublicKeyResponse>, HttpError>;

    /// Register an encrypted credential envelope.
    ///
    /// Decrypts the envelope, forwards the credential to the broker,
    /// registers a connection for every catalog region of the provider,
    /// probes each connection in parallel, and elects one
    /// region-representative connection per region. The response carries
    /// the redacted credential and the full connection list.
    #[endpoint {
        method = POST,
        path = "/tumblebug/credential",
        tags = ["credential"],
    }]
    async fn register_credential(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<CredentialReq>,
    ) -> Result<HttpResponseOk<CredentialInfo>, HttpError>;

    /// List connection configurations, optionally filtered.
    #[endpoint {
        method = GET,
        path = "/tumblebug/connConfig",
        tags = ["credential"],
    }]
    async fn list_conn_config(
        rqctx: RequestContext<Self::Context>,
        query: Query<ConnConfigFilterQuery>,
    ) -> Result<HttpResponseOk<ConnConfigList>, HttpError>;

    /// Get one connection configuration.
    #[endpoint {
        method = GET,
        path = "/tumblebug/connConfig/{connConfigName}",
        tags = ["credential"],
    }]
    async fn get_conn_config(
        rqctx: RequestContext<Self::Context>,
        path: Path<ConnConfigPath>,
    ) -> Result<HttpResponseOk<ConnConfig>, HttpError>;

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// Create or replace the label map of an entity.
    #[endpoint {
        method = PUT,
        path = "/tumblebug/label/{labelType}/{uid}",
        tags = ["label"],
    }]
    async fn put_labels(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelPath>,
        body: TypedBody<std::collections::BTreeMap<String, String>>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Get the label map of an entity.
    #[endpoint {
        method = GET,
        path = "/tumblebug/label/{labelType}/{uid}",
        tags = ["label"],
    }]
    async fn get_labels(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelPath>,
    ) -> Result<HttpResponseOk<std::collections::BTreeMap<String, String>>, HttpError>;

    /// Remove one label key from an entity.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/label/{labelType}/{uid}/{key}",
        tags = ["label"],
    }]
    async fn remove_label(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelKeyPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Select resources of a kind by label selector.
    ///
    /// Supports `=`, `!=`, `in (…)`, `notin (…)`, `exists`, and `!exists`
    /// clauses, comma-joined with AND semantics. Returns 400 on selector
    /// parse errors.
    #[endpoint {
        method = GET,
        path = "/tumblebug/resources/{labelType}",
        tags = ["label"],
    }]
    async fn select_resources(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelTypePath>,
        query: Query<LabelSelectorQuery>,
    ) -> Result<HttpResponseOk<ResourcesResponse>, HttpError>;

    // ------------------------------------------------------------------
    // Request tracking
    // ------------------------------------------------------------------

    /// Get one tracked request.
    #[endpoint {
        method = GET,
        path = "/tumblebug/request/{reqId}",
        tags = ["request"],
    }]
    async fn get_request(
        rqctx: RequestContext<Self::Context>,
        path: Path<ReqIdPath>,
    ) -> Result<HttpResponseOk<RequestRecord>, HttpError>;

    /// List tracked requests, newest first.
    #[endpoint {
        method = GET,
        path = "/tumblebug/requests",
        tags = ["request"],
    }]
    async fn list_requests(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<RequestList>, HttpError>;

    /// Delete one tracked request.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/request/{reqId}",
        tags = ["request"],
    }]
    async fn delete_request(
        rqctx: RequestContext<Self::Context>,
        path: Path<ReqIdPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Delete all tracked requests.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/requests",
        tags = ["request"],
    }]
    async fn delete_all_requests(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Raw object browsing
    // ------------------------------------------------------------------

    /// Fetch one raw store object by key.
    #[endpoint {
        method = GET,
        path = "/tumblebug/object",
        tags = ["admin"],
    }]
    async fn get_object(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<serde_json::Value>, HttpError>;

    /// List store keys under a prefix.
    #[endpoint {
        method = GET,
        path = "/tumblebug/objects",
        tags = ["admin"],
    }]
    async fn list_objects(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Delete one raw store object by key.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/object",
        tags = ["admin"],
    }]
    async fn delete_object(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Delete every store object under a prefix.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/objects",
        tags = ["admin"],
    }]
    async fn delete_objects(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // vNet
    // ------------------------------------------------------------------

    /// Create a vNet with at least one subnet.
    ///
    /// Subnet CIDRs must be contained in the vNet CIDR and pinned zones
    /// must belong to the connection's region. Returns 409 on duplicate id.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/vNet",
        tags = ["resource"],
    }]
    async fn post_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<VNetReq>,
    ) -> Result<HttpResponseOk<VNetInfo>, HttpError>;

    /// List vNets in a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/vNet",
        tags = ["resource"],
    }]
    async fn list_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<VNetInfo>>, HttpError>;

    /// Get a vNet, refreshing CSP identifiers from the broker.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/vNet/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<VNetInfo>, HttpError>;

    /// Delete a vNet.
    ///
    /// Fails with 409 while subnets exist unless `withSubnets=true`, in
    /// which case every subnet is deleted first.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/vNet/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        query: Query<WithSubnetsQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Adopt a pre-existing CSP vNet.
    ///
    /// The broker reports the vNet's current subnets; each becomes a local
    /// subnet with a synthesized `reg-subnet-NN` id and `Unknown` status.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/registerCspVNet",
        tags = ["resource"],
    }]
    async fn register_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<RegisterVNetReq>,
    ) -> Result<HttpResponseOk<VNetInfo>, HttpError>;

    /// Release an adopted vNet without destroying the CSP resource.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/registerCspVNet/{resourceId}",
        tags = ["resource"],
    }]
    async fn deregister_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        query: Query<WithSubnetsQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Add a subnet to an existing vNet.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/vNet/{resourceId}/subnet",
        tags = ["resource"],
    }]
    async fn post_subnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        body: TypedBody<SubnetReq>,
    ) -> Result<HttpResponseOk<SubnetInfo>, HttpError>;

    /// Delete a subnet from a vNet.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/vNet/{resourceId}/subnet/{subnetId}",
        tags = ["resource"],
    }]
    async fn del_subnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<SubnetPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Security groups
    // ------------------------------------------------------------------

    /// Create a security group with an initial rule set.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/securityGroup",
        tags = ["resource"],
    }]
    async fn post_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<SecurityGroupReq>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError>;

    /// List security groups in a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/securityGroup",
        tags = ["resource"],
    }]
    async fn list_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<SecurityGroupInfo>>, HttpError>;

    /// Get a security group.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/securityGroup/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError>;

    /// Delete a security group and its rules.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/securityGroup/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Append firewall rules to a security group.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/securityGroup/{resourceId}/rules",
        tags = ["resource"],
    }]
    async fn post_firewall_rules(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        body: TypedBody<FirewallRulesReq>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError>;

    /// Remove firewall rules matching on (direction, protocol, from, to,
    /// cidr).
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/securityGroup/{resourceId}/rules",
        tags = ["resource"],
    }]
    async fn del_firewall_rules(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        body: TypedBody<FirewallRulesReq>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError>;

    // ------------------------------------------------------------------
    // SSH keys
    // ------------------------------------------------------------------

    /// Create an SSH key pair. The private key is returned once.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/sshKey",
        tags = ["resource"],
    }]
    async fn post_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<SshKeyReq>,
    ) -> Result<HttpResponseOk<SshKeyInfo>, HttpError>;

    /// List SSH keys in a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/sshKey",
        tags = ["resource"],
    }]
    async fn list_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<SshKeyInfo>>, HttpError>;

    /// Get an SSH key.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/sshKey/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SshKeyInfo>, HttpError>;

    /// Delete an SSH key.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/sshKey/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Data disks
    // ------------------------------------------------------------------

    /// Create a data disk.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/dataDisk",
        tags = ["resource"],
    }]
    async fn post_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<DataDiskReq>,
    ) -> Result<HttpResponseOk<DataDiskInfo>, HttpError>;

    /// List data disks in a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/dataDisk",
        tags = ["resource"],
    }]
    async fn list_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<DataDiskInfo>>, HttpError>;

    /// Get a data disk.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/dataDisk/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<DataDiskInfo>, HttpError>;

    /// Delete a data disk. Fails with 409 while attached to a VM.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/dataDisk/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Specs and images
    // ------------------------------------------------------------------

    /// Fetch all specs visible through a connection into the cache.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/fetchSpecs",
        tags = ["resource"],
    }]
    async fn fetch_specs(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<FetchReq>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Filter cached specs by numeric range predicates on vCPU, memory,
    /// and cost.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/filterSpecsByRange",
        tags = ["resource"],
    }]
    async fn filter_specs_by_range(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<FilterSpecsByRangeReq>,
    ) -> Result<HttpResponseOk<Vec<SpecInfo>>, HttpError>;

    /// Get a cached spec.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/spec/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_spec(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SpecInfo>, HttpError>;

    /// Remove a spec from the cache.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/spec/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_spec(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Fetch all images visible through a connection into the cache.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/resources/fetchImages",
        tags = ["resource"],
    }]
    async fn fetch_images(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<FetchReq>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Get a cached image.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/image/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<ImageInfo>, HttpError>;

    /// Remove an image from the cache.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/image/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// List custom images in a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/customImage",
        tags = ["resource"],
    }]
    async fn list_custom_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<CustomImageInfo>>, HttpError>;

    /// Get a custom image.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/resources/customImage/{resourceId}",
        tags = ["resource"],
    }]
    async fn get_custom_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<CustomImageInfo>, HttpError>;

    /// Delete a custom image.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/resources/customImage/{resourceId}",
        tags = ["resource"],
    }]
    async fn del_custom_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // MCI
    // ------------------------------------------------------------------

    /// Create an MCI from VM templates.
    ///
    /// Each template expands into a subgroup; VM creations are dispatched
    /// to the broker in parallel. Per-VM failures are reported on the VM
    /// entries without failing the MCI.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/mciDynamic",
        tags = ["infra"],
    }]
    async fn post_mci_dynamic(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<MciDynamicReq>,
    ) -> Result<HttpResponseOk<MciInfo>, HttpError>;

    /// List MCI ids in a namespace.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci",
        tags = ["infra"],
    }]
    async fn list_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Get an MCI.
    ///
    /// With `option=status` the call refreshes every VM's state from the
    /// broker in parallel under a 60 s deadline and a 2 req/s path
    /// budget. Per-VM refresh errors are carried on the VM entries;
    /// exceeding the deadline returns 504 with the partial state flushed.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn get_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        query: Query<MciGetQuery>,
    ) -> Result<HttpResponseOk<MciInfo>, HttpError>;

    /// Delete an MCI and all of its VMs.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn del_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Control an MCI: suspend, resume, reboot, or terminate every VM.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/control/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn control_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        query: Query<ControlQuery>,
    ) -> Result<HttpResponseOk<MciFanoutResponse>, HttpError>;

    /// Run a command on every VM of an MCI.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/cmd/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn cmd_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        body: TypedBody<MciCmdReq>,
    ) -> Result<HttpResponseOk<MciFanoutResponse>, HttpError>;

    /// List the subgroups of an MCI.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/subgroup",
        tags = ["infra"],
    }]
    async fn list_subgroups(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<IdList>, HttpError>;

    /// Get one subgroup.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/subgroup/{subgroupId}",
        tags = ["infra"],
    }]
    async fn get_subgroup(
        rqctx: RequestContext<Self::Context>,
        path: Path<SubGroupPath>,
    ) -> Result<HttpResponseOk<SubGroupInfo>, HttpError>;

    /// Scale out a subgroup by N VMs using its stored template.
    ///
    /// New VM ids continue the subgroup's numbering
    /// (`<subgroupId>-<nextIndex>`).
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/subgroup/{subgroupId}",
        tags = ["infra"],
    }]
    async fn scale_out_subgroup(
        rqctx: RequestContext<Self::Context>,
        path: Path<SubGroupPath>,
        body: TypedBody<ScaleOutReq>,
    ) -> Result<HttpResponseOk<MciInfo>, HttpError>;

    /// Get one VM of an MCI.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vm/{vmId}",
        tags = ["infra"],
    }]
    async fn get_vm(
        rqctx: RequestContext<Self::Context>,
        path: Path<VmPath>,
    ) -> Result<HttpResponseOk<VmInfo>, HttpError>;

    /// Delete one VM.
    ///
    /// Deleting a VM that still serves as a bastion for other VMs fails
    /// with 409 unless `force=true`, which clears the references.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vm/{vmId}",
        tags = ["infra"],
    }]
    async fn del_vm(
        rqctx: RequestContext<Self::Context>,
        path: Path<VmPath>,
        query: Query<ForceQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Snapshot a VM into a custom image plus its data disks.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vm/{vmId}/snapshot",
        tags = ["infra"],
    }]
    async fn snapshot_vm(
        rqctx: RequestContext<Self::Context>,
        path: Path<VmPath>,
        body: TypedBody<VmSnapshotReq>,
    ) -> Result<HttpResponseOk<VmSnapshotResult>, HttpError>;

    // ------------------------------------------------------------------
    // Bastion wiring
    // ------------------------------------------------------------------

    /// Record that a VM is reached through a bastion VM.
    ///
    /// A VM cannot be its own bastion, and two VMs cannot bastion each
    /// other.
    #[endpoint {
        method = PUT,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vm/{vmId}/bastion/{bastionVmId}",
        tags = ["infra"],
    }]
    async fn set_bastion(
        rqctx: RequestContext<Self::Context>,
        path: Path<BastionSetPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    /// Look up the bastion of a VM.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vm/{vmId}/bastion",
        tags = ["infra"],
    }]
    async fn get_bastion(
        rqctx: RequestContext<Self::Context>,
        path: Path<BastionTargetPath>,
    ) -> Result<HttpResponseOk<BastionInfo>, HttpError>;

    /// Clear every reference to a bastion VM.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/bastion/{bastionVmId}",
        tags = ["infra"],
    }]
    async fn remove_bastion(
        rqctx: RequestContext<Self::Context>,
        path: Path<BastionPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Store an autoscaling policy verbatim. The manager never evaluates
    /// policies; an external loop consumes them.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/policy/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn post_mci_policy(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        body: TypedBody<serde_json::Value>,
    ) -> Result<HttpResponseOk<MciPolicyInfo>, HttpError>;

    /// Get the stored policy of an MCI.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/policy/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn get_mci_policy(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<MciPolicyInfo>, HttpError>;

    /// Delete the stored policy of an MCI.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/policy/mci/{mciId}",
        tags = ["infra"],
    }]
    async fn del_mci_policy(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError>;

    // ------------------------------------------------------------------
    // Site-to-site VPN
    // ------------------------------------------------------------------

    /// Create a site-to-site VPN between two vNets.
    ///
    /// Long-running; returns a request id immediately. Poll progress via
    /// the per-request endpoint.
    #[endpoint {
        method = POST,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vpn/{vpnId}",
        tags = ["infra"],
    }]
    async fn post_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
        body: TypedBody<VpnReq>,
    ) -> Result<HttpResponseOk<VpnRequestAck>, HttpError>;

    /// Update a site-to-site VPN. Long-running; returns a request id.
    #[endpoint {
        method = PUT,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vpn/{vpnId}",
        tags = ["infra"],
    }]
    async fn put_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
        body: TypedBody<VpnReq>,
    ) -> Result<HttpResponseOk<VpnRequestAck>, HttpError>;

    /// Delete a site-to-site VPN. Long-running; returns a request id.
    #[endpoint {
        method = DELETE,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vpn/{vpnId}",
        tags = ["infra"],
    }]
    async fn del_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
    ) -> Result<HttpResponseOk<VpnRequestAck>, HttpError>;

    /// Get a site-to-site VPN.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vpn/{vpnId}",
        tags = ["infra"],
    }]
    async fn get_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
    ) -> Result<HttpResponseOk<VpnInfo>, HttpError>;

    /// Poll the status of a long-running VPN operation.
    #[endpoint {
        method = GET,
        path = "/tumblebug/ns/{nsId}/mci/{mciId}/vpn/{vpnId}/request/{requestId}",
        tags = ["infra"],
    }]
    async fn get_vpn_request(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnRequestPath>,
    ) -> Result<HttpResponseOk<RequestRecord>, HttpError>;
}
