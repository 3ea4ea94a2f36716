// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! vNet and subnet lifecycle.
//!
//! A vNet is created together with at least one subnet in a single broker
//! call. Local subnet UUIDs are sent as the broker's NameIds so the
//! response can be correlated deterministically; the broker may reorder
//! the subnet list. Subnet keys are written before the final vNet write,
//! so readers never observe a subnet without its parent's final record.

use ipnet::Ipv4Net;

use mci_types::common::{ResourceKind, ResourceStatus, SimpleMsg};
use mci_types::conn::ConnConfig;
use mci_types::net::{
    RegisterVNetReq, SubnetInfo, SubnetReq, VNetInfo, VNetReq,
};

use crate::broker::{SpiderCreateVpcReqInfo, SpiderSubnetReqInfo, SpiderVpcInfo};
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::registry;
use crate::resource::{delete_entry, ensure_ns, exists, get_as, put_as, register_labels};
use crate::util::{check_name, gen_uid};

const KIND: ResourceKind = ResourceKind::VNet;

fn parse_cidr(cidr: &str, what: &str) -> Result<Ipv4Net, ApiError> {
    cidr.parse()
        .map_err(|_| ApiError::Validation(format!("invalid {what} CIDR: {cidr:?}")))
}

/// Resolve the connection and validate a vNet request: at least one
/// subnet, every subnet CIDR contained in the vNet CIDR, every pinned
/// zone declared by the connection's region.
async fn validate_vnet_req(ctx: &ApiContext, req: &VNetReq) -> Result<ConnConfig, ApiError> {
    check_name(&req.name)?;
    if req.subnet_info_list.is_empty() {
        return Err(ApiError::Validation(
            "at least one subnet is required".into(),
        ));
    }

    let conn = registry::get_conn_config(ctx, &req.connection_name)
        .await
        .map_err(|_| {
            ApiError::Validation(format!(
                "unknown connection: {}",
                req.connection_name
            ))
        })?;

    let vnet_net = parse_cidr(&req.cidr_block, "vNet")?;
    let zones = &conn.region_detail.zones;
    let mut seen_names = std::collections::HashSet::new();
    for subnet in &req.subnet_info_list {
        check_name(&subnet.name)?;
        if !seen_names.insert(subnet.name.as_str()) {
            return Err(ApiError::Validation(format!(
                "duplicate subnet name: {}",
                subnet.name
            )));
        }
        let subnet_net = parse_cidr(&subnet.ipv4_cidr, "subnet")?;
        if !vnet_net.contains(&subnet_net) {
            return Err(ApiError::Validation(format!(
                "subnet CIDR {} is not contained in vNet CIDR {}",
                subnet.ipv4_cidr, req.cidr_block
            )));
        }
        if !subnet.zone.is_empty() && !zones.contains(&subnet.zone) {
            return Err(ApiError::Validation(format!(
                "invalid zone: {} (region {} declares {:?})",
                subnet.zone, conn.region_detail.region_id, zones
            )));
        }
    }
    Ok(conn)
}

/// Create a vNet and its subnets.
pub async fn create_vnet(
    ctx: &ApiContext,
    ns_id: &str,
    req: VNetReq,
) -> Result<VNetInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    validate_vnet_req(ctx, &req).await?;

    if exists(ctx, ns_id, KIND, &req.name).await {
        return Err(ApiError::Conflict(format!(
            "already exists, vNet: {}",
            req.name
        )));
    }

    // Subnet UUIDs are assigned up front: they travel to the broker as
    // NameIds and anchor response correlation.
    let mut info = VNetInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: req.connection_name.clone(),
        cidr_block: req.cidr_block.clone(),
        description: req.description.clone(),
        status: ResourceStatus::Configuring,
        tag_list: req.tag_list.clone(),
        ..Default::default()
    };
    for subnet in &req.subnet_info_list {
        info.subnet_info_list.push(SubnetInfo {
            id: subnet.name.clone(),
            uuid: gen_uid(),
            name: subnet.name.clone(),
            ipv4_cidr: subnet.ipv4_cidr.clone(),
            zone: subnet.zone.clone(),
            status: ResourceStatus::Configuring,
            tag_list: subnet.tag_list.clone(),
            ..Default::default()
        });
    }

    put_as(ctx, ns_id, KIND, &info.id, &info).await?;

    let spider_req = SpiderCreateVpcReqInfo {
        name: info.uuid.clone(),
        ipv4_cidr: req.cidr_block.clone(),
        subnet_info_list: info
            .subnet_info_list
            .iter()
            .map(|s| SpiderSubnetReqInfo {
                name: s.uuid.clone(),
                ipv4_cidr: s.ipv4_cidr.clone(),
                zone: s.zone.clone(),
                tag_list: s.tag_list.clone(),
            })
            .collect(),
        tag_list: req.tag_list.clone(),
    };

    let resp = match ctx.broker.create_vpc(&req.connection_name, spider_req).await {
        Ok(resp) => resp,
        Err(e) => {
            info.status = ResourceStatus::ErrorOnConfiguring;
            put_as(ctx, ns_id, KIND, &info.id, &info).await?;
            return Err(e.into());
        }
    };

    reconcile_created(&mut info, &resp);
    info.status = if info.subnet_info_list.is_empty() {
        ResourceStatus::Available
    } else {
        ResourceStatus::InUse
    };

    // children first, parent's final record last
    for subnet in &info.subnet_info_list {
        ctx.store
            .put(
                &keys::subnet_key(ns_id, &info.id, &subnet.id),
                &serde_json::to_string(subnet)?,
            )
            .await?;
        register_labels(
            ctx,
            &ResourceKind::Subnet.to_string(),
            &subnet.uuid,
            &keys::subnet_key(ns_id, &info.id, &subnet.id),
            &[("sys.id", &subnet.id), ("sys.nsId", ns_id)],
        )
        .await?;
    }
    put_as(ctx, ns_id, KIND, &info.id, &info).await?;
    register_labels(
        ctx,
        &KIND.to_string(),
        &info.uuid,
        &keys::resource_key(ns_id, KIND, &info.id),
        &[("sys.id", &info.id), ("sys.nsId", ns_id)],
    )
    .await?;

    Ok(info)
}

/// Fold a broker VPC response into the local record, matching subnets by
/// UUID-as-NameId.
fn reconcile_created(info: &mut VNetInfo, resp: &SpiderVpcInfo) {
    info.csp_v_net_id = resp.i_id.system_id.clone();
    info.csp_v_net_name = resp.i_id.name_id.clone();
    if !resp.ipv4_cidr.is_empty() {
        info.cidr_block = resp.ipv4_cidr.clone();
    }
    info.key_value_list = resp.key_value_list.clone();

    for sp_subnet in &resp.subnet_info_list {
        for subnet in info.subnet_info_list.iter_mut() {
            if subnet.uuid == sp_subnet.i_id.name_id {
                subnet.connection_name = info.connection_name.clone();
                subnet.csp_v_net_id = resp.i_id.system_id.clone();
                subnet.csp_v_net_name = resp.i_id.name_id.clone();
                subnet.csp_subnet_id = sp_subnet.i_id.system_id.clone();
                subnet.csp_subnet_name = sp_subnet.i_id.name_id.clone();
                subnet.status = ResourceStatus::Available;
                subnet.zone = sp_subnet.zone.clone();
                subnet.ipv4_cidr = sp_subnet.ipv4_cidr.clone();
                subnet.key_value_list = sp_subnet.key_value_list.clone();
            }
        }
    }
}

/// Get a vNet, refreshing its CSP-level identifiers from the broker.
pub async fn get_vnet(ctx: &ApiContext, ns_id: &str, vnet_id: &str) -> Result<VNetInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(vnet_id)?;
    let mut info: VNetInfo = get_as(ctx, ns_id, KIND, vnet_id).await?;

    let resp = ctx
        .broker
        .get_vpc(&info.connection_name, &info.csp_v_net_name)
        .await?;
    info.csp_v_net_id = resp.i_id.system_id.clone();
    info.csp_v_net_name = resp.i_id.name_id.clone();
    if !resp.ipv4_cidr.is_empty() {
        info.cidr_block = resp.ipv4_cidr.clone();
    }
    info.key_value_list = resp.key_value_list.clone();

    put_as(ctx, ns_id, KIND, vnet_id, &info).await?;
    Ok(info)
}

async fn stored_subnets(
    ctx: &ApiContext,
    ns_id: &str,
    vnet_id: &str,
) -> Result<Vec<SubnetInfo>, ApiError> {
    let prefix = format!("{}/subnet", keys::resource_key(ns_id, KIND, vnet_id));
    let mut subnets = Vec::new();
    for entry in ctx.store.list(&prefix).await {
        subnets.push(serde_json::from_str::<SubnetInfo>(&entry.value)?);
    }
    Ok(subnets)
}

/// Delete a vNet. Blocks while subnets exist unless `with_subnets`.
pub async fn delete_vnet(
    ctx: &ApiContext,
    ns_id: &str,
    vnet_id: &str,
    with_subnets: bool,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(vnet_id)?;
    let mut info: VNetInfo = get_as(ctx, ns_id, KIND, vnet_id).await?;

    let subnets = stored_subnets(ctx, ns_id, vnet_id).await?;
    if !with_subnets && !subnets.is_empty() {
        return Err(ApiError::Conflict(format!(
            "the vNet ({vnet_id}) is in-use, it has {} subnet(s)",
            subnets.len()
        )));
    }
    for subnet in &subnets {
        delete_subnet(ctx, ns_id, vnet_id, &subnet.id).await?;
    }

    info.status = ResourceStatus::Deleting;
    put_as(ctx, ns_id, KIND, vnet_id, &info).await?;

    let result = match ctx
        .broker
        .delete_vpc(&info.connection_name, &info.csp_v_net_name)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, vnet_id, &info).await?;
            return Err(e.into());
        }
    };
    if !result.is_true() {
        info.status = ResourceStatus::ErrorOnDeleting;
        put_as(ctx, ns_id, KIND, vnet_id, &info).await?;
        return Err(ApiError::Internal(format!(
            "failed to delete the vNet ({vnet_id})"
        )));
    }

    delete_entry(ctx, ns_id, KIND, vnet_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the vNet ({vnet_id}) has been deleted"
    )))
}

/// Adopt a pre-existing CSP vNet. The broker reports the current subnet
/// list; each becomes a local subnet with a synthesized id and `Unknown`
/// status until first read.
pub async fn register_vnet(
    ctx: &ApiContext,
    ns_id: &str,
    req: RegisterVNetReq,
) -> Result<VNetInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(&req.name)?;
    if exists(ctx, ns_id, KIND, &req.name).await {
        return Err(ApiError::Conflict(format!(
            "already exists, vNet: {}",
            req.name
        )));
    }

    let mut info = VNetInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: req.connection_name.clone(),
        description: req.description.clone(),
        status: ResourceStatus::Registering,
        system_label: "Registered from CSP resource".into(),
        ..Default::default()
    };
    put_as(ctx, ns_id, KIND, &info.id, &info).await?;

    let resp = match ctx
        .broker
        .register_vpc(&req.connection_name, &gen_uid(), &req.csp_v_net_id)
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            info.status = ResourceStatus::ErrorOnRegistering;
            put_as(ctx, ns_id, KIND, &info.id, &info).await?;
            return Err(e.into());
        }
    };

    info.csp_v_net_id = resp.i_id.system_id.clone();
    info.csp_v_net_name = resp.i_id.name_id.clone();
    info.cidr_block = resp.ipv4_cidr.clone();
    info.key_value_list = resp.key_value_list.clone();

    for (i, sp_subnet) in resp.subnet_info_list.iter().enumerate() {
        let subnet = SubnetInfo {
            id: format!("reg-subnet-{:02}", i + 1),
            uuid: gen_uid(),
            name: format!("reg-subnet-{:02}", i + 1),
            connection_name: info.connection_name.clone(),
            csp_v_net_id: resp.i_id.system_id.clone(),
            csp_v_net_name: resp.i_id.name_id.clone(),
            status: ResourceStatus::Unknown,
            csp_subnet_id: sp_subnet.i_id.system_id.clone(),
            csp_subnet_name: sp_subnet.i_id.name_id.clone(),
            zone: sp_subnet.zone.clone(),
            ipv4_cidr: sp_subnet.ipv4_cidr.clone(),
            key_value_list: sp_subnet.key_value_list.clone(),
            ..Default::default()
        };
        ctx.store
            .put(
                &keys::subnet_key(ns_id, &info.id, &subnet.id),
                &serde_json::to_string(&subnet)?,
            )
            .await?;
        info.subnet_info_list.push(subnet);
    }

    info.status = ResourceStatus::Available;
    put_as(ctx, ns_id, KIND, &info.id, &info).await?;
    register_labels(
        ctx,
        &KIND.to_string(),
        &info.uuid,
        &keys::resource_key(ns_id, KIND, &info.id),
        &[("sys.id", &info.id), ("sys.nsId", ns_id)],
    )
    .await?;

    Ok(info)
}

/// Release an adopted vNet: the broker forgets it, the CSP resource
/// stays. Local subnet records are removed with it.
pub async fn deregister_vnet(
    ctx: &ApiContext,
    ns_id: &str,
    vnet_id: &str,
    with_subnets: bool,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(vnet_id)?;
    let mut info: VNetInfo = get_as(ctx, ns_id, KIND, vnet_id).await?;

    let subnets = stored_subnets(ctx, ns_id, vnet_id).await?;
    if !with_subnets && !subnets.is_empty() {
        return Err(ApiError::Conflict(format!(
            "the vNet ({vnet_id}) is in-use, it has {} subnet(s)",
            subnets.len()
        )));
    }

    info.status = ResourceStatus::Deregistering;
    put_as(ctx, ns_id, KIND, vnet_id, &info).await?;

    let result = match ctx
        .broker
        .deregister_vpc(&info.connection_name, &info.csp_v_net_name)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            info.status = ResourceStatus::ErrorOnDeregistering;
            put_as(ctx, ns_id, KIND, vnet_id, &info).await?;
            return Err(e.into());
        }
    };
    if !result.is_true() {
        info.status = ResourceStatus::ErrorOnDeregistering;
        put_as(ctx, ns_id, KIND, vnet_id, &info).await?;
        return Err(ApiError::Internal(format!(
            "failed to deregister the vNet ({vnet_id})"
        )));
    }

    for subnet in &subnets {
        ctx.store
            .delete(&keys::subnet_key(ns_id, vnet_id, &subnet.id))
            .await?;
        ctx.labels
            .remove_entity(&ResourceKind::Subnet.to_string(), &subnet.uuid)
            .await?;
    }
    delete_entry(ctx, ns_id, KIND, vnet_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the vNet ({vnet_id}) has been deregistered"
    )))
}

/// Add one subnet to an existing vNet.
pub async fn add_subnet(
    ctx: &ApiContext,
    ns_id: &str,
    vnet_id: &str,
    req: SubnetReq,
) -> Result<SubnetInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(vnet_id)?;
    check_name(&req.name)?;
    let mut vnet: VNetInfo = get_as(ctx, ns_id, KIND, vnet_id).await?;

    if ctx
        .store
        .exists(&keys::subnet_key(ns_id, vnet_id, &req.name))
        .await
    {
        return Err(ApiError::Conflict(format!(
            "already exists, subnet: {}",
            req.name
        )));
    }

    let vnet_net = parse_cidr(&vnet.cidr_block, "vNet")?;
    let subnet_net = parse_cidr(&req.ipv4_cidr, "subnet")?;
    if !vnet_net.contains(&subnet_net) {
        return Err(ApiError::Validation(format!(
            "subnet CIDR {} is not contained in vNet CIDR {}",
            req.ipv4_cidr, vnet.cidr_block
        )));
    }
    let conn = registry::get_conn_config(ctx, &vnet.connection_name).await?;
    if !req.zone.is_empty() && !conn.region_detail.zones.contains(&req.zone) {
        return Err(ApiError::Validation(format!("invalid zone: {}", req.zone)));
    }

    let mut subnet = SubnetInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: vnet.connection_name.clone(),
        ipv4_cidr: req.ipv4_cidr.clone(),
        zone: req.zone.clone(),
        status: ResourceStatus::Configuring,
        tag_list: req.tag_list.clone(),
        ..Default::default()
    };
    ctx.store
        .put(
            &keys::subnet_key(ns_id, vnet_id, &subnet.id),
            &serde_json::to_string(&subnet)?,
        )
        .await?;

    let resp = match ctx
        .broker
        .add_subnet(
            &vnet.connection_name,
            &vnet.csp_v_net_name,
            SpiderSubnetReqInfo {
                name: subnet.uuid.clone(),
                ipv4_cidr: req.ipv4_cidr.clone(),
                zone: req.zone.clone(),
                tag_list: req.tag_list.clone(),
            },
        )
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            subnet.status = ResourceStatus::ErrorOnConfiguring;
            ctx.store
                .put(
                    &keys::subnet_key(ns_id, vnet_id, &subnet.id),
                    &serde_json::to_string(&subnet)?,
                )
                .await?;
            return Err(e.into());
        }
    };

    // the broker answers with the whole VPC; pick our subnet by NameId
    if let Some(sp_subnet) = resp
        .subnet_info_list
        .iter()
        .find(|s| s.i_id.name_id == subnet.uuid)
    {
        subnet.csp_subnet_id = sp_subnet.i_id.system_id.clone();
        subnet.csp_subnet_name = sp_subnet.i_id.name_id.clone();
        subnet.zone = sp_subnet.zone.clone();
        subnet.ipv4_cidr = sp_subnet.ipv4_cidr.clone();
        subnet.key_value_list = sp_subnet.key_value_list.clone();
    }
    subnet.csp_v_net_id = resp.i_id.system_id.clone();
    subnet.csp_v_net_name = resp.i_id.name_id.clone();
    subnet.status = ResourceStatus::Available;

    ctx.store
        .put(
            &keys::subnet_key(ns_id, vnet_id, &subnet.id),
            &serde_json::to_string(&subnet)?,
        )
        .await?;
    register_labels(
        ctx,
        &ResourceKind::Subnet.to_string(),
        &subnet.uuid,
        &keys::subnet_key(ns_id, vnet_id, &subnet.id),
        &[("sys.id", &subnet.id), ("sys.nsId", ns_id)],
    )
    .await?;

    vnet.subnet_info_list.push(subnet.clone());
    vnet.status = ResourceStatus::InUse;
    put_as(ctx, ns_id, KIND, vnet_id, &vnet).await?;

    Ok(subnet)
}

/// Delete one subnet of a vNet.
pub async fn delete_subnet(
    ctx: &ApiContext,
    ns_id: &str,
    vnet_id: &str,
    subnet_id: &str,
) -> Result<SimpleMsg, ApiError> {
    let vnet: VNetInfo = get_as(ctx, ns_id, KIND, vnet_id).await?;
    let subnet_key = keys::subnet_key(ns_id, vnet_id, subnet_id);
    let raw = ctx
        .store
        .get(&subnet_key)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("subnet not found: {subnet_id}")))?;
    let mut subnet: SubnetInfo = serde_json::from_str(&raw)?;

    subnet.status = ResourceStatus::Deleting;
    ctx.store
        .put(&subnet_key, &serde_json::to_string(&subnet)?)
        .await?;

    // an adopted or failed subnet may carry no CSP name; nothing to
    // destroy broker-side then
    if !subnet.csp_subnet_name.is_empty() {
        if let Err(e) = ctx
            .broker
            .remove_subnet(
                &vnet.connection_name,
                &vnet.csp_v_net_name,
                &subnet.csp_subnet_name,
            )
            .await
        {
            subnet.status = ResourceStatus::ErrorOnDeleting;
            ctx.store
                .put(&subnet_key, &serde_json::to_string(&subnet)?)
                .await?;
            return Err(e.into());
        }
    }

    ctx.store.delete(&subnet_key).await?;
    ctx.labels
        .remove_entity(&ResourceKind::Subnet.to_string(), &subnet.uuid)
        .await?;

    // drop the subnet from the parent record
    let mut vnet = vnet;
    vnet.subnet_info_list.retain(|s| s.id != subnet_id);
    if vnet.subnet_info_list.is_empty() && vnet.status == ResourceStatus::InUse {
        vnet.status = ResourceStatus::Available;
    }
    put_as(ctx, ns_id, KIND, vnet_id, &vnet).await?;

    Ok(SimpleMsg::new(format!(
        "the subnet ({subnet_id}) has been deleted"
    )))
}
