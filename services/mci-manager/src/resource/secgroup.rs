// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Security groups and their firewall rules.
//!
//! The rule set is carried on the group entity, so deleting the group
//! removes the rules from the local view atomically. Rules are matched
//! for removal on the full (direction, protocol, from, to, cidr) tuple.

use mci_types::common::{ResourceKind, ResourceStatus, SimpleMsg};
use mci_types::mci::VmInfo;
use mci_types::net::{FirewallRule, SecurityGroupInfo, SecurityGroupReq};

use crate::broker::{SpiderSecurityGroupReqInfo, SpiderSecurityRule};
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::{delete_entry, ensure_ns, exists, get_as, put_as, register_labels};
use crate::util::{check_name, gen_uid};

const KIND: ResourceKind = ResourceKind::SecurityGroup;

fn to_spider_rule(rule: &FirewallRule) -> SpiderSecurityRule {
    SpiderSecurityRule {
        direction: rule.direction.clone(),
        ip_protocol: rule.protocol.clone(),
        from_port: rule.from_port.clone(),
        to_port: rule.to_port.clone(),
        cidr: rule.cidr.clone(),
    }
}

pub async fn create_security_group(
    ctx: &ApiContext,
    ns_id: &str,
    req: SecurityGroupReq,
) -> Result<SecurityGroupInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(&req.name)?;
    if exists(ctx, ns_id, KIND, &req.name).await {
        return Err(ApiError::Conflict(format!(
            "already exists, securityGroup: {}",
            req.name
        )));
    }

    let vnet: mci_types::net::VNetInfo =
        get_as(ctx, ns_id, ResourceKind::VNet, &req.v_net_id).await?;

    let mut info = SecurityGroupInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: req.connection_name.clone(),
        v_net_id: req.v_net_id.clone(),
        description: req.description.clone(),
        status: ResourceStatus::Configuring,
        firewall_rules: req.firewall_rules.clone(),
        ..Default::default()
    };
    put_as(ctx, ns_id, KIND, &info.id, &info).await?;

    let resp = match ctx
        .broker
        .create_security_group(
            &req.connection_name,
            SpiderSecurityGroupReqInfo {
                name: info.uuid.clone(),
                vpc_name: vnet.csp_v_net_name.clone(),
                security_rules: req.firewall_rules.iter().map(to_spider_rule).collect(),
            },
        )
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            info.status = ResourceStatus::ErrorOnConfiguring;
            put_as(ctx, ns_id, KIND, &info.id, &info).await?;
            return Err(e.into());
        }
    };

    info.csp_security_group_id = resp.i_id.system_id;
    info.csp_security_group_name = resp.i_id.name_id;
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

pub async fn get_security_group(
    ctx: &ApiContext,
    ns_id: &str,
    sg_id: &str,
) -> Result<SecurityGroupInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(sg_id)?;
    get_as(ctx, ns_id, KIND, sg_id).await
}

/// VMs that still reference the security group.
async fn referencing_vms(
    ctx: &ApiContext,
    ns_id: &str,
    sg_id: &str,
) -> Result<Vec<String>, ApiError> {
    let mut users = Vec::new();
    for entry in ctx.store.list(&format!("/ns/{ns_id}/mci/")).await {
        if !entry.key.contains("/vm/") {
            continue;
        }
        let vm: VmInfo = serde_json::from_str(&entry.value)?;
        if vm.sg_ids.iter().any(|id| id == sg_id) {
            users.push(vm.id);
        }
    }
    Ok(users)
}

pub async fn delete_security_group(
    ctx: &ApiContext,
    ns_id: &str,
    sg_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(sg_id)?;
    let mut info: SecurityGroupInfo = get_as(ctx, ns_id, KIND, sg_id).await?;

    let users = referencing_vms(ctx, ns_id, sg_id).await?;
    if !users.is_empty() {
        return Err(ApiError::Conflict(format!(
            "the securityGroup ({sg_id}) is in-use by VM(s): {}",
            users.join(", ")
        )));
    }

    info.status = ResourceStatus::Deleting;
    put_as(ctx, ns_id, KIND, sg_id, &info).await?;

    match ctx
        .broker
        .delete_security_group(&info.connection_name, &info.csp_security_group_name)
        .await
    {
        Ok(result) if result.is_true() => {}
        Ok(_) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, sg_id, &info).await?;
            return Err(ApiError::Internal(format!(
                "failed to delete the securityGroup ({sg_id})"
            )));
        }
        Err(e) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, sg_id, &info).await?;
            return Err(e.into());
        }
    }

    delete_entry(ctx, ns_id, KIND, sg_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the securityGroup ({sg_id}) has been deleted"
    )))
}

/// Append rules to a security group; duplicates of existing rules are
/// rejected.
pub async fn add_firewall_rules(
    ctx: &ApiContext,
    ns_id: &str,
    sg_id: &str,
    rules: Vec<FirewallRule>,
) -> Result<SecurityGroupInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let mut info: SecurityGroupInfo = get_as(ctx, ns_id, KIND, sg_id).await?;
    if rules.is_empty() {
        return Err(ApiError::Validation("no firewall rules provided".into()));
    }
    for rule in &rules {
        if info.firewall_rules.contains(rule) {
            return Err(ApiError::Conflict(format!(
                "rule already present: {rule:?}"
            )));
        }
    }

    info.status = ResourceStatus::Updating;
    put_as(ctx, ns_id, KIND, sg_id, &info).await?;

    match ctx
        .broker
        .add_security_rules(
            &info.connection_name,
            &info.csp_security_group_name,
            rules.iter().map(to_spider_rule).collect(),
        )
        .await
    {
        Ok(_) => {}
        Err(e) => {
            info.status = ResourceStatus::ErrorOnUpdating;
            put_as(ctx, ns_id, KIND, sg_id, &info).await?;
            return Err(e.into());
        }
    }

    info.firewall_rules.extend(rules);
    info.status = ResourceStatus::Available;
    put_as(ctx, ns_id, KIND, sg_id, &info).await?;
    Ok(info)
}

/// Remove rules matching on the full tuple; unmatched rules are an error.
pub async fn remove_firewall_rules(
    ctx: &ApiContext,
    ns_id: &str,
    sg_id: &str,
    rules: Vec<FirewallRule>,
) -> Result<SecurityGroupInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let mut info: SecurityGroupInfo = get_as(ctx, ns_id, KIND, sg_id).await?;
    for rule in &rules {
        if !info.firewall_rules.contains(rule) {
            return Err(ApiError::NotFound(format!("no such rule: {rule:?}")));
        }
    }

    info.status = ResourceStatus::Updating;
    put_as(ctx, ns_id, KIND, sg_id, &info).await?;

    match ctx
        .broker
        .remove_security_rules(
            &info.connection_name,
            &info.csp_security_group_name,
            rules.iter().map(to_spider_rule).collect(),
        )
        .await
    {
        Ok(_) => {}
        Err(e) => {
            info.status = ResourceStatus::ErrorOnUpdating;
            put_as(ctx, ns_id, KIND, sg_id, &info).await?;
            return Err(e.into());
        }
    }

    info.firewall_rules.retain(|r| !rules.contains(r));
    info.status = ResourceStatus::Available;
    put_as(ctx, ns_id, KIND, sg_id, &info).await?;
    Ok(info)
}
