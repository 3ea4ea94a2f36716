// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! SSH key pairs. The broker generates the pair; the private key is kept
//! in the store for command dispatch and returned once at creation.

use mci_types::common::{ResourceKind, ResourceStatus, SimpleMsg};
use mci_types::mci::VmInfo;
use mci_types::net::{SshKeyInfo, SshKeyReq};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::{delete_entry, ensure_ns, exists, get_as, put_as, register_labels};
use crate::util::{check_name, gen_uid};

const KIND: ResourceKind = ResourceKind::SshKey;

pub async fn create_ssh_key(
    ctx: &ApiContext,
    ns_id: &str,
    req: SshKeyReq,
) -> Result<SshKeyInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(&req.name)?;
    if exists(ctx, ns_id, KIND, &req.name).await {
        return Err(ApiError::Conflict(format!(
            "already exists, sshKey: {}",
            req.name
        )));
    }

    let mut info = SshKeyInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: req.connection_name.clone(),
        description: req.description.clone(),
        status: ResourceStatus::Configuring,
        ..Default::default()
    };
    put_as(ctx, ns_id, KIND, &info.id, &info).await?;

    let resp = match ctx
        .broker
        .create_keypair(&req.connection_name, &info.uuid)
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            info.status = ResourceStatus::ErrorOnConfiguring;
            put_as(ctx, ns_id, KIND, &info.id, &info).await?;
            return Err(e.into());
        }
    };

    info.csp_ssh_key_id = resp.i_id.system_id;
    info.csp_ssh_key_name = resp.i_id.name_id;
    info.fingerprint = resp.fingerprint;
    info.public_key = resp.public_key;
    info.private_key = resp.private_key;
    info.username = resp.vm_user_id;
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

pub async fn get_ssh_key(
    ctx: &ApiContext,
    ns_id: &str,
    key_id: &str,
) -> Result<SshKeyInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(key_id)?;
    get_as(ctx, ns_id, KIND, key_id).await
}

pub async fn delete_ssh_key(
    ctx: &ApiContext,
    ns_id: &str,
    key_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(key_id)?;
    let mut info: SshKeyInfo = get_as(ctx, ns_id, KIND, key_id).await?;

    // refuse while any VM still boots with this key
    let mut users = Vec::new();
    for entry in ctx.store.list(&format!("/ns/{ns_id}/mci/")).await {
        if !entry.key.contains("/vm/") {
            continue;
        }
        let vm: VmInfo = serde_json::from_str(&entry.value)?;
        if vm.ssh_key_id == key_id {
            users.push(vm.id);
        }
    }
    if !users.is_empty() {
        return Err(ApiError::Conflict(format!(
            "the sshKey ({key_id}) is in-use by VM(s): {}",
            users.join(", ")
        )));
    }

    info.status = ResourceStatus::Deleting;
    put_as(ctx, ns_id, KIND, key_id, &info).await?;

    match ctx
        .broker
        .delete_keypair(&info.connection_name, &info.csp_ssh_key_name)
        .await
    {
        Ok(result) if result.is_true() => {}
        Ok(_) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, key_id, &info).await?;
            return Err(ApiError::Internal(format!(
                "failed to delete the sshKey ({key_id})"
            )));
        }
        Err(e) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, key_id, &info).await?;
            return Err(e.into());
        }
    }

    delete_entry(ctx, ns_id, KIND, key_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the sshKey ({key_id}) has been deleted"
    )))
}
