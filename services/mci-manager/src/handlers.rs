// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Trait implementation of the HTTP surface.
//!
//! Handlers are thin: open a tracked request, call into the core module,
//! close the record with the outcome, map the error kind to an HTTP
//! status. All real logic lives in the core modules.

use std::collections::BTreeMap;

use dropshot::{HttpError, HttpResponseOk, Path, Query, RequestContext, TypedBody};
use serde::Serialize;

use mci_manager_api::{
    BastionPath, BastionSetPath, BastionTargetPath, ConnConfigFilterQuery, ConnConfigPath,
    ControlQuery, ExistsResponse, ForceQuery, K8sAvailabilityQuery, K8sProviderQuery, KeyQuery,
    LabelKeyPath, LabelPath, LabelSelectorQuery, LabelTypePath, MciGetQuery, MciManagerApi,
    MciPath, NsPath, NsResourcePath, ProviderRegionPath, ReadyzResponse, ReqIdPath,
    ResourcesResponse, SubGroupPath, SubnetPath, VmPath, VpnPath, VpnRequestPath,
    WithSubnetsQuery,
};
use mci_types::catalog::{regional_availability, CloudCatalog, K8sAvailableItem, RegionDetail};
use mci_types::common::{IdList, NsInfo, NsReq, SimpleMsg};
use mci_types::conn::{ConnConfig, ConnConfigList, CredentialInfo, CredentialReq, PublicKeyResponse};
use mci_types::mci::{
    BastionInfo, MciCmdReq, MciDynamicReq, MciFanoutResponse, MciInfo, MciPolicyInfo, ScaleOutReq,
    SubGroupInfo, VmInfo, VmSnapshotReq, VmSnapshotResult, VpnInfo, VpnReq, VpnRequestAck,
};
use mci_types::net::{
    CustomImageInfo, DataDiskInfo, DataDiskReq, FetchReq, FilterSpecsByRangeReq, FirewallRulesReq,
    ImageInfo, RegisterVNetReq, SecurityGroupInfo, SecurityGroupReq, SpecInfo, SshKeyInfo,
    SshKeyReq, SubnetInfo, SubnetReq, VNetInfo, VNetReq,
};
use mci_types::request::{RequestList, RequestRecord};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::mci;
use crate::registry;
use crate::resource;

/// The API implementation type.
pub enum MciManagerImpl {}

/// Build the dropshot API description for the service.
pub fn api_description() -> Result<dropshot::ApiDescription<ApiContext>, String> {
    mci_manager_api::mci_manager_api_mod::api_description::<MciManagerImpl>()
        .map_err(|e| e.to_string())
}

/// Run one tracked operation: open a request record, execute, close the
/// record with the outcome, and map errors to HTTP statuses.
async fn tracked<T, F>(
    ctx: &ApiContext,
    method: &str,
    path: String,
    body: Option<serde_json::Value>,
    operation: F,
) -> Result<HttpResponseOk<T>, HttpError>
where
    T: Serialize + schemars::JsonSchema + Send + Sync + 'static,
    F: std::future::Future<Output = Result<T, ApiError>>,
{
    let req_id = ctx.requests.begin(method, &path, body).await?;
    finish(ctx, req_id, operation.await).await
}

/// Like [`tracked`], but charges the MCI read-path budget as well.
async fn tracked_mci_read<T, F>(
    ctx: &ApiContext,
    method: &str,
    path: String,
    operation: F,
) -> Result<HttpResponseOk<T>, HttpError>
where
    T: Serialize + schemars::JsonSchema + Send + Sync + 'static,
    F: std::future::Future<Output = Result<T, ApiError>>,
{
    let req_id = ctx.requests.begin_mci_read(method, &path).await?;
    finish(ctx, req_id, operation.await).await
}

async fn finish<T: Serialize + schemars::JsonSchema + Send + Sync + 'static>(
    ctx: &ApiContext,
    req_id: String,
    result: Result<T, ApiError>,
) -> Result<HttpResponseOk<T>, HttpError> {
    match result {
        Ok(value) => {
            let dump = serde_json::to_value(&value).unwrap_or_default();
            let _ = ctx.requests.finish(&req_id, Ok(dump)).await;
            Ok(HttpResponseOk(value))
        }
        Err(e) => {
            let _ = ctx.requests.finish(&req_id, Err(e.to_string())).await;
            Err(e.into())
        }
    }
}

impl MciManagerApi for MciManagerImpl {
    type Context = ApiContext;

    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    async fn readyz(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<ReadyzResponse>, HttpError> {
        let ctx = rqctx.context();
        if !ctx.is_ready() {
            return Err(HttpError::for_unavail(None, "not ready".to_string()));
        }
        Ok(HttpResponseOk(ReadyzResponse {
            message: "ready".to_string(),
        }))
    }

    async fn http_version(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let version = format!("{:?}", rqctx.request.version());
        Ok(HttpResponseOk(SimpleMsg::new(version)))
    }

    // ------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------

    async fn post_ns(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<NsReq>,
    ) -> Result<HttpResponseOk<NsInfo>, HttpError> {
        let ctx = rqctx.context();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(ctx, "POST", "/tumblebug/ns".into(), dump, async {
            resource::ns::create_ns(ctx, req).await
        })
        .await
    }

    async fn list_ns(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        tracked(ctx, "GET", "/tumblebug/ns".into(), None, async {
            resource::ns::list_ns(ctx).await
        })
        .await
    }

    async fn get_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<NsInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(ctx, "GET", format!("/tumblebug/ns/{}", p.ns_id), None, async {
            resource::ns::get_ns(ctx, &p.ns_id).await
        })
        .await
    }

    async fn put_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<NsReq>,
    ) -> Result<HttpResponseOk<NsInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(ctx, "PUT", format!("/tumblebug/ns/{}", p.ns_id), dump, async {
            resource::ns::update_ns(ctx, &p.ns_id, req).await
        })
        .await
    }

    async fn del_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(ctx, "DELETE", format!("/tumblebug/ns/{}", p.ns_id), None, async {
            resource::ns::delete_ns(ctx, &p.ns_id).await
        })
        .await
    }

    async fn check_ns(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<ExistsResponse>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let exists = resource::ns::check_ns(ctx, &p.ns_id).await.map_err(HttpError::from)?;
        Ok(HttpResponseOk(ExistsResponse { exists }))
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    async fn list_providers(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        Ok(HttpResponseOk(IdList {
            id_list: ctx.catalog.provider_names(),
        }))
    }

    async fn get_region(
        rqctx: RequestContext<Self::Context>,
        path: Path<ProviderRegionPath>,
    ) -> Result<HttpResponseOk<RegionDetail>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let region = ctx
            .catalog
            .region(&p.provider_name, &p.region_name)
            .cloned()
            .ok_or_else(|| {
                HttpError::from(ApiError::NotFound(format!(
                    "region not found: {}/{}",
                    p.provider_name, p.region_name
                )))
            })?;
        Ok(HttpResponseOk(region))
    }

    async fn get_cloud_info(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<CloudCatalog>, HttpError> {
        Ok(HttpResponseOk(rqctx.context().catalog.clone()))
    }

    async fn available_k8s_cluster_version(
        rqctx: RequestContext<Self::Context>,
        query: Query<K8sAvailabilityQuery>,
    ) -> Result<HttpResponseOk<Vec<K8sAvailableItem>>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let detail = ctx.k8s_catalog.provider(&q.provider_name).ok_or_else(|| {
            HttpError::from(ApiError::NotFound(format!(
                "unsupported provider for kubernetes clusters: {}",
                q.provider_name
            )))
        })?;
        let available = regional_availability(&detail.version, &q.region_name)
            .map(|a| a.available.clone())
            .unwrap_or_default();
        Ok(HttpResponseOk(available))
    }

    async fn available_k8s_cluster_node_image(
        rqctx: RequestContext<Self::Context>,
        query: Query<K8sAvailabilityQuery>,
    ) -> Result<HttpResponseOk<Vec<K8sAvailableItem>>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let detail = ctx.k8s_catalog.provider(&q.provider_name).ok_or_else(|| {
            HttpError::from(ApiError::NotFound(format!(
                "unsupported provider for kubernetes clusters: {}",
                q.provider_name
            )))
        })?;
        let available = regional_availability(&detail.node_image, &q.region_name)
            .map(|a| a.available.clone())
            .unwrap_or_default();
        Ok(HttpResponseOk(available))
    }

    async fn check_node_groups_on_k8s_creation(
        rqctx: RequestContext<Self::Context>,
        query: Query<K8sProviderQuery>,
    ) -> Result<HttpResponseOk<ExistsResponse>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let detail = ctx.k8s_catalog.provider(&q.provider_name).ok_or_else(|| {
            HttpError::from(ApiError::NotFound(format!(
                "unsupported provider for kubernetes clusters: {}",
                q.provider_name
            )))
        })?;
        Ok(HttpResponseOk(ExistsResponse {
            exists: detail.node_groups_on_creation,
        }))
    }

    // ------------------------------------------------------------------
    // Credentials and connections
    // ------------------------------------------------------------------

    async fn get_public_key(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<PublicKeyResponse>, HttpError> {
        let ctx = rqctx.context();
        tracked(ctx, "GET", "/tumblebug/credential/publicKey".into(), None, async {
            ctx.keyring.issue().await
        })
        .await
    }

    async fn register_credential(
        rqctx: RequestContext<Self::Context>,
        body: TypedBody<CredentialReq>,
    ) -> Result<HttpResponseOk<CredentialInfo>, HttpError> {
        let ctx = rqctx.context();
        let req = body.into_inner();
        // the envelope is not dumped: it carries encrypted key material
        tracked(ctx, "POST", "/tumblebug/credential".into(), None, async {
            registry::register_credential(ctx, req).await
        })
        .await
    }

    async fn list_conn_config(
        rqctx: RequestContext<Self::Context>,
        query: Query<ConnConfigFilterQuery>,
    ) -> Result<HttpResponseOk<ConnConfigList>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let list = registry::get_conn_config_list(
            ctx,
            q.filter_credential_holder.as_deref(),
            q.filter_verified.unwrap_or(false),
            q.filter_region_representative.unwrap_or(false),
        )
        .await
        .map_err(HttpError::from)?;
        Ok(HttpResponseOk(list))
    }

    async fn get_conn_config(
        rqctx: RequestContext<Self::Context>,
        path: Path<ConnConfigPath>,
    ) -> Result<HttpResponseOk<ConnConfig>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let conn = registry::get_conn_config(ctx, &p.conn_config_name)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(conn))
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    async fn put_labels(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelPath>,
        body: TypedBody<BTreeMap<String, String>>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let labels = body.into_inner();
        tracked(
            ctx,
            "PUT",
            format!("/tumblebug/label/{}/{}", p.label_type, p.uid),
            serde_json::to_value(&labels).ok(),
            async {
                // keep the resource key the entity registered at creation;
                // fall back to the naive /<kind>/<uid> mapping
                let resource_key = match ctx.labels.get_labels(&p.label_type, &p.uid).await? {
                    Some(record) => record.resource_key,
                    None => format!("/{}/{}", p.label_type, p.uid),
                };
                ctx.labels
                    .put_labels(&p.label_type, &p.uid, &resource_key, labels)
                    .await?;
                Ok(SimpleMsg::new("Label created or updated successfully"))
            },
        )
        .await
    }

    async fn get_labels(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelPath>,
    ) -> Result<HttpResponseOk<BTreeMap<String, String>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let record = ctx
            .labels
            .get_labels(&p.label_type, &p.uid)
            .await
            .map_err(ApiError::from)
            .map_err(HttpError::from)?
            .ok_or_else(|| {
                HttpError::from(ApiError::NotFound(format!(
                    "no labels for {}/{}",
                    p.label_type, p.uid
                )))
            })?;
        Ok(HttpResponseOk(record.labels))
    }

    async fn remove_label(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelKeyPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/label/{}/{}/{}", p.label_type, p.uid, p.key),
            None,
            async {
                ctx.labels
                    .remove_label(&p.label_type, &p.uid, &p.key)
                    .await?;
                Ok(SimpleMsg::new("Label removed successfully"))
            },
        )
        .await
    }

    async fn select_resources(
        rqctx: RequestContext<Self::Context>,
        path: Path<LabelTypePath>,
        query: Query<LabelSelectorQuery>,
    ) -> Result<HttpResponseOk<ResourcesResponse>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let selector = query.into_inner().label_selector.unwrap_or_default();
        let results = ctx
            .labels
            .select(&p.label_type, &selector)
            .await
            .map_err(ApiError::from)
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(ResourcesResponse { results }))
    }

    // ------------------------------------------------------------------
    // Request tracking
    // ------------------------------------------------------------------

    async fn get_request(
        rqctx: RequestContext<Self::Context>,
        path: Path<ReqIdPath>,
    ) -> Result<HttpResponseOk<RequestRecord>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        Ok(HttpResponseOk(
            ctx.requests.get(&p.req_id).await.map_err(HttpError::from)?,
        ))
    }

    async fn list_requests(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<RequestList>, HttpError> {
        let ctx = rqctx.context();
        Ok(HttpResponseOk(
            ctx.requests.list().await.map_err(HttpError::from)?,
        ))
    }

    async fn delete_request(
        rqctx: RequestContext<Self::Context>,
        path: Path<ReqIdPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        ctx.requests.delete(&p.req_id).await.map_err(HttpError::from)?;
        Ok(HttpResponseOk(SimpleMsg::new(format!(
            "the request ({}) has been deleted",
            p.req_id
        ))))
    }

    async fn delete_all_requests(
        rqctx: RequestContext<Self::Context>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let removed = ctx.requests.delete_all().await.map_err(HttpError::from)?;
        Ok(HttpResponseOk(SimpleMsg::new(format!(
            "{removed} request record(s) deleted"
        ))))
    }

    // ------------------------------------------------------------------
    // Raw object browsing
    // ------------------------------------------------------------------

    async fn get_object(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<serde_json::Value>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let raw = ctx.store.get(&q.key).await.ok_or_else(|| {
            HttpError::from(ApiError::NotFound(format!("no object at key: {}", q.key)))
        })?;
        let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
        Ok(HttpResponseOk(value))
    }

    async fn list_objects(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let keys = ctx
            .store
            .list(&q.key)
            .await
            .into_iter()
            .map(|e| e.key)
            .collect();
        Ok(HttpResponseOk(IdList { id_list: keys }))
    }

    async fn delete_object(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        if !ctx.store.exists(&q.key).await {
            return Err(HttpError::from(ApiError::NotFound(format!(
                "no object at key: {}",
                q.key
            ))));
        }
        ctx.store
            .delete(&q.key)
            .await
            .map_err(ApiError::from)
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(SimpleMsg::new(format!(
            "the object ({}) has been deleted",
            q.key
        ))))
    }

    async fn delete_objects(
        rqctx: RequestContext<Self::Context>,
        query: Query<KeyQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let q = query.into_inner();
        let removed = ctx
            .store
            .delete_prefix(&q.key)
            .await
            .map_err(ApiError::from)
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(SimpleMsg::new(format!(
            "{removed} object(s) deleted under {}",
            q.key
        ))))
    }

    // ------------------------------------------------------------------
    // vNet
    // ------------------------------------------------------------------

    async fn post_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<VNetReq>,
    ) -> Result<HttpResponseOk<VNetInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/resources/vNet", p.ns_id),
            dump,
            async { resource::vnet::create_vnet(ctx, &p.ns_id, req).await },
        )
        .await
    }

    async fn list_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<VNetInfo>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        resource::ensure_ns(ctx, &p.ns_id).await.map_err(HttpError::from)?;
        let list = resource::list_as(ctx, &p.ns_id, mci_types::common::ResourceKind::VNet)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(list))
    }

    async fn get_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<VNetInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "GET",
            format!("/tumblebug/ns/{}/resources/vNet/{}", p.ns_id, p.resource_id),
            None,
            async { resource::vnet::get_vnet(ctx, &p.ns_id, &p.resource_id).await },
        )
        .await
    }

    async fn del_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        query: Query<WithSubnetsQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let with_subnets = query.into_inner().with_subnets.unwrap_or(false);
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/resources/vNet/{}", p.ns_id, p.resource_id),
            None,
            async { resource::vnet::delete_vnet(ctx, &p.ns_id, &p.resource_id, with_subnets).await },
        )
        .await
    }

    async fn register_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<RegisterVNetReq>,
    ) -> Result<HttpResponseOk<VNetInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/registerCspVNet", p.ns_id),
            dump,
            async { resource::vnet::register_vnet(ctx, &p.ns_id, req).await },
        )
        .await
    }

    async fn deregister_vnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        query: Query<WithSubnetsQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let with_subnets = query.into_inner().with_subnets.unwrap_or(false);
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/registerCspVNet/{}", p.ns_id, p.resource_id),
            None,
            async {
                resource::vnet::deregister_vnet(ctx, &p.ns_id, &p.resource_id, with_subnets).await
            },
        )
        .await
    }

    async fn post_subnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        body: TypedBody<SubnetReq>,
    ) -> Result<HttpResponseOk<SubnetInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!(
                "/tumblebug/ns/{}/resources/vNet/{}/subnet",
                p.ns_id, p.resource_id
            ),
            dump,
            async { resource::vnet::add_subnet(ctx, &p.ns_id, &p.resource_id, req).await },
        )
        .await
    }

    async fn del_subnet(
        rqctx: RequestContext<Self::Context>,
        path: Path<SubnetPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!(
                "/tumblebug/ns/{}/resources/vNet/{}/subnet/{}",
                p.ns_id, p.resource_id, p.subnet_id
            ),
            None,
            async {
                resource::vnet::delete_subnet(ctx, &p.ns_id, &p.resource_id, &p.subnet_id).await
            },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Security groups
    // ------------------------------------------------------------------

    async fn post_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<SecurityGroupReq>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/resources/securityGroup", p.ns_id),
            dump,
            async { resource::secgroup::create_security_group(ctx, &p.ns_id, req).await },
        )
        .await
    }

    async fn list_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<SecurityGroupInfo>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        resource::ensure_ns(ctx, &p.ns_id).await.map_err(HttpError::from)?;
        let list = resource::list_as(ctx, &p.ns_id, mci_types::common::ResourceKind::SecurityGroup)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(list))
    }

    async fn get_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = resource::secgroup::get_security_group(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_security_group(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!(
                "/tumblebug/ns/{}/resources/securityGroup/{}",
                p.ns_id, p.resource_id
            ),
            None,
            async { resource::secgroup::delete_security_group(ctx, &p.ns_id, &p.resource_id).await },
        )
        .await
    }

    async fn post_firewall_rules(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        body: TypedBody<FirewallRulesReq>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!(
                "/tumblebug/ns/{}/resources/securityGroup/{}/rules",
                p.ns_id, p.resource_id
            ),
            dump,
            async {
                resource::secgroup::add_firewall_rules(
                    ctx,
                    &p.ns_id,
                    &p.resource_id,
                    req.firewall_rules,
                )
                .await
            },
        )
        .await
    }

    async fn del_firewall_rules(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
        body: TypedBody<FirewallRulesReq>,
    ) -> Result<HttpResponseOk<SecurityGroupInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "DELETE",
            format!(
                "/tumblebug/ns/{}/resources/securityGroup/{}/rules",
                p.ns_id, p.resource_id
            ),
            dump,
            async {
                resource::secgroup::remove_firewall_rules(
                    ctx,
                    &p.ns_id,
                    &p.resource_id,
                    req.firewall_rules,
                )
                .await
            },
        )
        .await
    }

    // ------------------------------------------------------------------
    // SSH keys
    // ------------------------------------------------------------------

    async fn post_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<SshKeyReq>,
    ) -> Result<HttpResponseOk<SshKeyInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/resources/sshKey", p.ns_id),
            dump,
            async { resource::sshkey::create_ssh_key(ctx, &p.ns_id, req).await },
        )
        .await
    }

    async fn list_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<SshKeyInfo>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        resource::ensure_ns(ctx, &p.ns_id).await.map_err(HttpError::from)?;
        let list = resource::list_as(ctx, &p.ns_id, mci_types::common::ResourceKind::SshKey)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(list))
    }

    async fn get_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SshKeyInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = resource::sshkey::get_ssh_key(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_ssh_key(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/resources/sshKey/{}", p.ns_id, p.resource_id),
            None,
            async { resource::sshkey::delete_ssh_key(ctx, &p.ns_id, &p.resource_id).await },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Data disks
    // ------------------------------------------------------------------

    async fn post_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<DataDiskReq>,
    ) -> Result<HttpResponseOk<DataDiskInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/resources/dataDisk", p.ns_id),
            dump,
            async { resource::datadisk::create_data_disk(ctx, &p.ns_id, req).await },
        )
        .await
    }

    async fn list_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<DataDiskInfo>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        resource::ensure_ns(ctx, &p.ns_id).await.map_err(HttpError::from)?;
        let list = resource::list_as(ctx, &p.ns_id, mci_types::common::ResourceKind::DataDisk)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(list))
    }

    async fn get_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<DataDiskInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = resource::datadisk::get_data_disk(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_data_disk(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/resources/dataDisk/{}", p.ns_id, p.resource_id),
            None,
            async { resource::datadisk::delete_data_disk(ctx, &p.ns_id, &p.resource_id).await },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Specs and images
    // ------------------------------------------------------------------

    async fn fetch_specs(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<FetchReq>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/resources/fetchSpecs", p.ns_id),
            serde_json::to_value(&req).ok(),
            async { resource::spec::fetch_specs(ctx, &p.ns_id, &req.connection_name).await },
        )
        .await
    }

    async fn filter_specs_by_range(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<FilterSpecsByRangeReq>,
    ) -> Result<HttpResponseOk<Vec<SpecInfo>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let specs = resource::spec::filter_specs_by_range(ctx, &p.ns_id, &req)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(specs))
    }

    async fn get_spec(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SpecInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = resource::spec::get_spec(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_spec(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let msg = resource::spec::delete_spec(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(msg))
    }

    async fn fetch_images(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<FetchReq>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/resources/fetchImages", p.ns_id),
            serde_json::to_value(&req).ok(),
            async { resource::image::fetch_images(ctx, &p.ns_id, &req.connection_name).await },
        )
        .await
    }

    async fn get_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<ImageInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = resource::image::get_image(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let msg = resource::image::delete_image(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(msg))
    }

    async fn list_custom_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<Vec<CustomImageInfo>>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        resource::ensure_ns(ctx, &p.ns_id).await.map_err(HttpError::from)?;
        let list = resource::list_as(ctx, &p.ns_id, mci_types::common::ResourceKind::CustomImage)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(list))
    }

    async fn get_custom_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<CustomImageInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = resource::image::get_custom_image(ctx, &p.ns_id, &p.resource_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_custom_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsResourcePath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!(
                "/tumblebug/ns/{}/resources/customImage/{}",
                p.ns_id, p.resource_id
            ),
            None,
            async { resource::image::delete_custom_image(ctx, &p.ns_id, &p.resource_id).await },
        )
        .await
    }

    // ------------------------------------------------------------------
    // MCI
    // ------------------------------------------------------------------

    async fn post_mci_dynamic(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
        body: TypedBody<MciDynamicReq>,
    ) -> Result<HttpResponseOk<MciInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/mciDynamic", p.ns_id),
            dump,
            async { mci::create_mci_dynamic(ctx, &p.ns_id, req).await },
        )
        .await
    }

    async fn list_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<NsPath>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked_mci_read(ctx, "GET", format!("/tumblebug/ns/{}/mci", p.ns_id), async {
            mci::list_mci(ctx, &p.ns_id).await
        })
        .await
    }

    async fn get_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        query: Query<MciGetQuery>,
    ) -> Result<HttpResponseOk<MciInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let live_status = query.into_inner().option.as_deref() == Some("status");
        tracked_mci_read(
            ctx,
            "GET",
            format!("/tumblebug/ns/{}/mci/{}", p.ns_id, p.mci_id),
            async { mci::get_mci(ctx, &p.ns_id, &p.mci_id, live_status).await },
        )
        .await
    }

    async fn del_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/mci/{}", p.ns_id, p.mci_id),
            None,
            async { mci::delete_mci(ctx, &p.ns_id, &p.mci_id).await },
        )
        .await
    }

    async fn control_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        query: Query<ControlQuery>,
    ) -> Result<HttpResponseOk<MciFanoutResponse>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let action = query.into_inner().action;
        tracked(
            ctx,
            "GET",
            format!("/tumblebug/ns/{}/control/mci/{}", p.ns_id, p.mci_id),
            None,
            async { mci::control_mci(ctx, &p.ns_id, &p.mci_id, action).await },
        )
        .await
    }

    async fn cmd_mci(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        body: TypedBody<MciCmdReq>,
    ) -> Result<HttpResponseOk<MciFanoutResponse>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let dump = serde_json::to_value(&req).ok();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/cmd/mci/{}", p.ns_id, p.mci_id),
            dump,
            async { mci::cmd_mci(ctx, &p.ns_id, &p.mci_id, req).await },
        )
        .await
    }

    async fn list_subgroups(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<IdList>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let ids = mci::list_subgroups(ctx, &p.ns_id, &p.mci_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(ids))
    }

    async fn get_subgroup(
        rqctx: RequestContext<Self::Context>,
        path: Path<SubGroupPath>,
    ) -> Result<HttpResponseOk<SubGroupInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = mci::get_subgroup(ctx, &p.ns_id, &p.mci_id, &p.subgroup_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn scale_out_subgroup(
        rqctx: RequestContext<Self::Context>,
        path: Path<SubGroupPath>,
        body: TypedBody<ScaleOutReq>,
    ) -> Result<HttpResponseOk<MciInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        tracked(
            ctx,
            "POST",
            format!(
                "/tumblebug/ns/{}/mci/{}/subgroup/{}",
                p.ns_id, p.mci_id, p.subgroup_id
            ),
            serde_json::to_value(&req).ok(),
            async {
                mci::scale_out_subgroup(
                    ctx,
                    &p.ns_id,
                    &p.mci_id,
                    &p.subgroup_id,
                    req.number_of_added_vm,
                )
                .await
            },
        )
        .await
    }

    async fn get_vm(
        rqctx: RequestContext<Self::Context>,
        path: Path<VmPath>,
    ) -> Result<HttpResponseOk<VmInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let vm = mci::get_vm(ctx, &p.ns_id, &p.mci_id, &p.vm_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(vm))
    }

    async fn del_vm(
        rqctx: RequestContext<Self::Context>,
        path: Path<VmPath>,
        query: Query<ForceQuery>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let force = query.into_inner().force.unwrap_or(false);
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/mci/{}/vm/{}", p.ns_id, p.mci_id, p.vm_id),
            None,
            async { mci::delete_vm(ctx, &p.ns_id, &p.mci_id, &p.vm_id, force).await },
        )
        .await
    }

    async fn snapshot_vm(
        rqctx: RequestContext<Self::Context>,
        path: Path<VmPath>,
        body: TypedBody<VmSnapshotReq>,
    ) -> Result<HttpResponseOk<VmSnapshotResult>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        tracked(
            ctx,
            "POST",
            format!(
                "/tumblebug/ns/{}/mci/{}/vm/{}/snapshot",
                p.ns_id, p.mci_id, p.vm_id
            ),
            serde_json::to_value(&req).ok(),
            async { mci::snapshot::snapshot_vm(ctx, &p.ns_id, &p.mci_id, &p.vm_id, req).await },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Bastion wiring
    // ------------------------------------------------------------------

    async fn set_bastion(
        rqctx: RequestContext<Self::Context>,
        path: Path<BastionSetPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "PUT",
            format!(
                "/tumblebug/ns/{}/mci/{}/vm/{}/bastion/{}",
                p.ns_id, p.mci_id, p.vm_id, p.bastion_vm_id
            ),
            None,
            async {
                mci::bastion::set_bastion(ctx, &p.ns_id, &p.mci_id, &p.vm_id, &p.bastion_vm_id)
                    .await
            },
        )
        .await
    }

    async fn get_bastion(
        rqctx: RequestContext<Self::Context>,
        path: Path<BastionTargetPath>,
    ) -> Result<HttpResponseOk<BastionInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = mci::bastion::get_bastion(ctx, &p.ns_id, &p.mci_id, &p.vm_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn remove_bastion(
        rqctx: RequestContext<Self::Context>,
        path: Path<BastionPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!(
                "/tumblebug/ns/{}/mci/{}/bastion/{}",
                p.ns_id, p.mci_id, p.bastion_vm_id
            ),
            None,
            async {
                mci::bastion::remove_bastion(ctx, &p.ns_id, &p.mci_id, &p.bastion_vm_id).await
            },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    async fn post_mci_policy(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
        body: TypedBody<serde_json::Value>,
    ) -> Result<HttpResponseOk<MciPolicyInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let policy = body.into_inner();
        tracked(
            ctx,
            "POST",
            format!("/tumblebug/ns/{}/policy/mci/{}", p.ns_id, p.mci_id),
            Some(policy.clone()),
            async { mci::policy::put_policy(ctx, &p.ns_id, &p.mci_id, policy).await },
        )
        .await
    }

    async fn get_mci_policy(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<MciPolicyInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = mci::policy::get_policy(ctx, &p.ns_id, &p.mci_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn del_mci_policy(
        rqctx: RequestContext<Self::Context>,
        path: Path<MciPath>,
    ) -> Result<HttpResponseOk<SimpleMsg>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        tracked(
            ctx,
            "DELETE",
            format!("/tumblebug/ns/{}/policy/mci/{}", p.ns_id, p.mci_id),
            None,
            async { mci::policy::delete_policy(ctx, &p.ns_id, &p.mci_id).await },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Site-to-site VPN
    // ------------------------------------------------------------------

    async fn post_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
        body: TypedBody<VpnReq>,
    ) -> Result<HttpResponseOk<VpnRequestAck>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let ack = mci::vpn::create_vpn(ctx, &p.ns_id, &p.mci_id, &p.vpn_id, req)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(ack))
    }

    async fn put_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
        body: TypedBody<VpnReq>,
    ) -> Result<HttpResponseOk<VpnRequestAck>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let req = body.into_inner();
        let ack = mci::vpn::update_vpn(ctx, &p.ns_id, &p.mci_id, &p.vpn_id, req)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(ack))
    }

    async fn del_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
    ) -> Result<HttpResponseOk<VpnRequestAck>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let ack = mci::vpn::delete_vpn(ctx, &p.ns_id, &p.mci_id, &p.vpn_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(ack))
    }

    async fn get_vpn(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnPath>,
    ) -> Result<HttpResponseOk<VpnInfo>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let info = mci::vpn::get_vpn(ctx, &p.ns_id, &p.mci_id, &p.vpn_id)
            .await
            .map_err(HttpError::from)?;
        Ok(HttpResponseOk(info))
    }

    async fn get_vpn_request(
        rqctx: RequestContext<Self::Context>,
        path: Path<VpnRequestPath>,
    ) -> Result<HttpResponseOk<RequestRecord>, HttpError> {
        let ctx = rqctx.context();
        let p = path.into_inner();
        let record =
            mci::vpn::get_vpn_request(ctx, &p.ns_id, &p.mci_id, &p.vpn_id, &p.request_id)
                .await
                .map_err(HttpError::from)?;
        Ok(HttpResponseOk(record))
    }
}
