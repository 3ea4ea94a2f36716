// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Data disks.

use mci_types::common::{ResourceKind, ResourceStatus, SimpleMsg};
use mci_types::net::{DataDiskInfo, DataDiskReq};

use crate::broker::SpiderDiskReqInfo;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::{delete_entry, ensure_ns, exists, get_as, put_as, register_labels};
use crate::util::{check_name, gen_uid};

const KIND: ResourceKind = ResourceKind::DataDisk;

pub async fn create_data_disk(
    ctx: &ApiContext,
    ns_id: &str,
    req: DataDiskReq,
) -> Result<DataDiskInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(&req.name)?;
    if exists(ctx, ns_id, KIND, &req.name).await {
        return Err(ApiError::Conflict(format!(
            "already exists, dataDisk: {}",
            req.name
        )));
    }

    let mut info = DataDiskInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: req.connection_name.clone(),
        disk_type: req.disk_type.clone(),
        disk_size: req.disk_size.clone(),
        description: req.description.clone(),
        status: ResourceStatus::Configuring,
        ..Default::default()
    };
    put_as(ctx, ns_id, KIND, &info.id, &info).await?;

    let resp = match ctx
        .broker
        .create_disk(
            &req.connection_name,
            SpiderDiskReqInfo {
                name: info.uuid.clone(),
                disk_type: req.disk_type.clone(),
                disk_size: req.disk_size.clone(),
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

    info.csp_data_disk_id = resp.i_id.system_id;
    info.csp_data_disk_name = resp.i_id.name_id;
    if !resp.disk_type.is_empty() {
        info.disk_type = resp.disk_type;
    }
    if !resp.disk_size.is_empty() {
        info.disk_size = resp.disk_size;
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

pub async fn get_data_disk(
    ctx: &ApiContext,
    ns_id: &str,
    disk_id: &str,
) -> Result<DataDiskInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(disk_id)?;
    get_as(ctx, ns_id, KIND, disk_id).await
}

pub async fn delete_data_disk(
    ctx: &ApiContext,
    ns_id: &str,
    disk_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(disk_id)?;
    let mut info: DataDiskInfo = get_as(ctx, ns_id, KIND, disk_id).await?;

    if !info.associated_object_list.is_empty() {
        return Err(ApiError::Conflict(format!(
            "the dataDisk ({disk_id}) is attached to: {}",
            info.associated_object_list.join(", ")
        )));
    }

    info.status = ResourceStatus::Deleting;
    put_as(ctx, ns_id, KIND, disk_id, &info).await?;

    match ctx
        .broker
        .delete_disk(&info.connection_name, &info.csp_data_disk_name)
        .await
    {
        Ok(result) if result.is_true() => {}
        Ok(_) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, disk_id, &info).await?;
            return Err(ApiError::Internal(format!(
                "failed to delete the dataDisk ({disk_id})"
            )));
        }
        Err(e) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, KIND, disk_id, &info).await?;
            return Err(e.into());
        }
    }

    delete_entry(ctx, ns_id, KIND, disk_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the dataDisk ({disk_id}) has been deleted"
    )))
}
