// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Site-to-site VPNs.
//!
//! Create, update, and delete are long-running: the handler acknowledges
//! with a request id immediately and a background task drives the broker
//! call, publishing progress entries under that id. Nothing is rolled
//! back if the process dies mid-flight; the next read reconciles the
//! stored state against the broker.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use mci_types::common::ResourceKind;
use mci_types::mci::{VpnInfo, VpnReq, VpnRequestAck};
use mci_types::net::VNetInfo;
use mci_types::request::RequestRecord;

use crate::broker::{BrokerClient, SpiderVpnReqInfo};
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::requests::RequestTracker;
use crate::resource::{ensure_ns, get_as};
use crate::util::{check_name, gen_uid};
use kvstore::Store;

/// VPN operations ride the long timeout class.
const VPN_TIMEOUT: Duration = Duration::from_secs(600);

async fn load_vpn(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vpn_id: &str,
) -> Result<VpnInfo, ApiError> {
    let raw = ctx
        .store
        .get(&keys::vpn_key(ns_id, mci_id, vpn_id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("VPN not found: {vpn_id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

async fn resolve_sites(
    ctx: &ApiContext,
    ns_id: &str,
    req: &VpnReq,
) -> Result<(VNetInfo, VNetInfo), ApiError> {
    let site1: VNetInfo = get_as(ctx, ns_id, ResourceKind::VNet, &req.site1.v_net_id).await?;
    let site2: VNetInfo = get_as(ctx, ns_id, ResourceKind::VNet, &req.site2.v_net_id).await?;
    Ok((site1, site2))
}

#[derive(Clone, Copy)]
enum VpnOp {
    Create,
    Update,
}

#[allow(clippy::too_many_arguments)]
fn spawn_vpn_task(
    broker: BrokerClient,
    store: Store,
    tracker: Arc<RequestTracker>,
    req_id: String,
    vpn_key: String,
    mut vpn: VpnInfo,
    req_info: SpiderVpnReqInfo,
    connection_name: String,
    op: VpnOp,
    terminal_status: &'static str,
    error_status: &'static str,
) {
    tokio::spawn(async move {
        let _ = tracker.progress(&req_id, "dispatching to broker").await;
        let result = match op {
            VpnOp::Create => broker.create_vpn(&connection_name, req_info, VPN_TIMEOUT).await,
            VpnOp::Update => broker.update_vpn(&connection_name, req_info, VPN_TIMEOUT).await,
        };
        match result {
            Ok(resp) => {
                vpn.status = terminal_status.to_string();
                if let Ok(raw) = serde_json::to_string(&vpn) {
                    let _ = store.put(&vpn_key, &raw).await;
                }
                let _ = tracker.progress(&req_id, "broker acknowledged").await;
                let _ = tracker
                    .finish(
                        &req_id,
                        Ok(serde_json::json!({
                            "vpnId": vpn.id,
                            "status": vpn.status,
                            "cspVpnName": resp.i_id.name_id,
                        })),
                    )
                    .await;
            }
            Err(e) => {
                warn!(vpn_id = %vpn.id, error = %e, "VPN operation failed");
                vpn.status = error_status.to_string();
                if let Ok(raw) = serde_json::to_string(&vpn) {
                    let _ = store.put(&vpn_key, &raw).await;
                }
                let _ = tracker.finish(&req_id, Err(e.to_string())).await;
            }
        }
    });
}

/// Create a site-to-site VPN; acknowledges with a request id immediately.
pub async fn create_vpn(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vpn_id: &str,
    req: VpnReq,
) -> Result<VpnRequestAck, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(vpn_id)?;
    if !ctx.store.exists(&keys::mci_key(ns_id, mci_id)).await {
        return Err(ApiError::NotFound(format!("MCI not found: {mci_id}")));
    }
    let vpn_key = keys::vpn_key(ns_id, mci_id, vpn_id);
    if ctx.store.exists(&vpn_key).await {
        return Err(ApiError::Conflict(format!("already exists, VPN: {vpn_id}")));
    }
    let (site1_vnet, site2_vnet) = resolve_sites(ctx, ns_id, &req).await?;

    let req_id = ctx
        .requests
        .begin(
            "POST",
            &format!("/ns/{ns_id}/mci/{mci_id}/vpn/{vpn_id}"),
            Some(serde_json::to_value(&req)?),
        )
        .await?;

    let vpn = VpnInfo {
        id: vpn_id.to_string(),
        uuid: gen_uid(),
        name: req.name.clone(),
        status: "Configuring".into(),
        site1: req.site1.clone(),
        site2: req.site2.clone(),
        request_id: req_id.clone(),
    };
    ctx.store
        .put(&vpn_key, &serde_json::to_string(&vpn)?)
        .await?;

    spawn_vpn_task(
        ctx.broker.clone(),
        ctx.store.clone(),
        Arc::clone(&ctx.requests),
        req_id.clone(),
        vpn_key,
        vpn,
        SpiderVpnReqInfo {
            name: gen_uid(),
            local_vpc_name: site1_vnet.csp_v_net_name.clone(),
            peer_vpc_name: site2_vnet.csp_v_net_name.clone(),
            peer_connection_name: req.site2.connection_name.clone(),
        },
        req.site1.connection_name.clone(),
        VpnOp::Create,
        "Available",
        "ErrorOnConfiguring",
    );

    Ok(VpnRequestAck {
        vpn_id: vpn_id.to_string(),
        request_id: req_id,
        message: format!("the VPN ({vpn_id}) is being configured"),
    })
}

/// Update a site-to-site VPN; acknowledges with a request id immediately.
pub async fn update_vpn(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vpn_id: &str,
    req: VpnReq,
) -> Result<VpnRequestAck, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let mut vpn = load_vpn(ctx, ns_id, mci_id, vpn_id).await?;
    let (site1_vnet, site2_vnet) = resolve_sites(ctx, ns_id, &req).await?;

    let req_id = ctx
        .requests
        .begin(
            "PUT",
            &format!("/ns/{ns_id}/mci/{mci_id}/vpn/{vpn_id}"),
            Some(serde_json::to_value(&req)?),
        )
        .await?;

    let vpn_key = keys::vpn_key(ns_id, mci_id, vpn_id);
    vpn.status = "Updating".into();
    vpn.site1 = req.site1.clone();
    vpn.site2 = req.site2.clone();
    vpn.request_id = req_id.clone();
    ctx.store
        .put(&vpn_key, &serde_json::to_string(&vpn)?)
        .await?;

    spawn_vpn_task(
        ctx.broker.clone(),
        ctx.store.clone(),
        Arc::clone(&ctx.requests),
        req_id.clone(),
        vpn_key,
        vpn,
        SpiderVpnReqInfo {
            name: gen_uid(),
            local_vpc_name: site1_vnet.csp_v_net_name.clone(),
            peer_vpc_name: site2_vnet.csp_v_net_name.clone(),
            peer_connection_name: req.site2.connection_name.clone(),
        },
        req.site1.connection_name.clone(),
        VpnOp::Update,
        "Available",
        "ErrorOnUpdating",
    );

    Ok(VpnRequestAck {
        vpn_id: vpn_id.to_string(),
        request_id: req_id,
        message: format!("the VPN ({vpn_id}) is being updated"),
    })
}

/// Delete a site-to-site VPN; acknowledges with a request id immediately.
pub async fn delete_vpn(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vpn_id: &str,
) -> Result<VpnRequestAck, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let mut vpn = load_vpn(ctx, ns_id, mci_id, vpn_id).await?;

    let req_id = ctx
        .requests
        .begin(
            "DELETE",
            &format!("/ns/{ns_id}/mci/{mci_id}/vpn/{vpn_id}"),
            None,
        )
        .await?;

    let vpn_key = keys::vpn_key(ns_id, mci_id, vpn_id);
    vpn.status = "Deleting".into();
    vpn.request_id = req_id.clone();
    ctx.store
        .put(&vpn_key, &serde_json::to_string(&vpn)?)
        .await?;

    let broker = ctx.broker.clone();
    let store = ctx.store.clone();
    let tracker = Arc::clone(&ctx.requests);
    let connection_name = vpn.site1.connection_name.clone();
    let name = vpn.name.clone();
    let ack_req_id = req_id.clone();
    tokio::spawn(async move {
        let _ = tracker.progress(&req_id, "dispatching to broker").await;
        match broker.delete_vpn(&connection_name, &name, VPN_TIMEOUT).await {
            Ok(result) if result.is_true() => {
                let _ = store.delete(&vpn_key).await;
                let _ = tracker
                    .finish(&req_id, Ok(serde_json::json!({"deleted": vpn.id})))
                    .await;
            }
            Ok(_) => {
                vpn.status = "ErrorOnDeleting".into();
                if let Ok(raw) = serde_json::to_string(&vpn) {
                    let _ = store.put(&vpn_key, &raw).await;
                }
                let _ = tracker
                    .finish(&req_id, Err("broker refused the deletion".into()))
                    .await;
            }
            Err(e) => {
                vpn.status = "ErrorOnDeleting".into();
                if let Ok(raw) = serde_json::to_string(&vpn) {
                    let _ = store.put(&vpn_key, &raw).await;
                }
                let _ = tracker.finish(&req_id, Err(e.to_string())).await;
            }
        }
    });

    Ok(VpnRequestAck {
        vpn_id: vpn_id.to_string(),
        request_id: ack_req_id,
        message: format!("the VPN ({vpn_id}) is being deleted"),
    })
}

pub async fn get_vpn(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vpn_id: &str,
) -> Result<VpnInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    load_vpn(ctx, ns_id, mci_id, vpn_id).await
}

/// Poll the progress of a long-running VPN operation.
pub async fn get_vpn_request(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vpn_id: &str,
    request_id: &str,
) -> Result<RequestRecord, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    load_vpn(ctx, ns_id, mci_id, vpn_id).await?;
    ctx.requests.get(request_id).await
}
