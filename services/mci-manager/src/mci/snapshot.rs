// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! VM snapshots: one broker snapshot call yields a custom image plus a
//! data disk entity per captured disk, all linked back to the source VM's
//! spec and connection.

use std::time::Duration;

use mci_types::common::{ResourceKind, ResourceStatus};
use mci_types::mci::{VmSnapshotReq, VmSnapshotResult};
use mci_types::net::{CustomImageInfo, DataDiskInfo};

use crate::broker::SpiderMyImageReqInfo;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::mci::load_vm;
use crate::resource::{ensure_ns, exists, put_as, register_labels};
use crate::util::{check_name, gen_uid};

/// Snapshots ride the long timeout class.
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn snapshot_vm(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vm_id: &str,
    req: VmSnapshotReq,
) -> Result<VmSnapshotResult, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(&req.name)?;
    let vm = load_vm(ctx, ns_id, mci_id, vm_id).await?;
    if vm.csp_vm_name.is_empty() {
        return Err(ApiError::Validation(format!(
            "the VM ({vm_id}) has no CSP identifier to snapshot"
        )));
    }
    if exists(ctx, ns_id, ResourceKind::CustomImage, &req.name).await {
        return Err(ApiError::Conflict(format!(
            "already exists, customImage: {}",
            req.name
        )));
    }

    let mut image = CustomImageInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        connection_name: vm.connection_name.clone(),
        source_vm_id: vm.id.clone(),
        source_vm_spec_id: vm.spec_id.clone(),
        status: ResourceStatus::Configuring,
        ..Default::default()
    };
    put_as(ctx, ns_id, ResourceKind::CustomImage, &image.id, &image).await?;

    let resp = match ctx
        .broker
        .snapshot_vm(
            &vm.connection_name,
            SpiderMyImageReqInfo {
                name: image.uuid.clone(),
                source_vm: vm.csp_vm_name.clone(),
            },
            SNAPSHOT_TIMEOUT,
        )
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            image.status = ResourceStatus::ErrorOnConfiguring;
            put_as(ctx, ns_id, ResourceKind::CustomImage, &image.id, &image).await?;
            return Err(e.into());
        }
    };

    image.csp_custom_image_id = resp.i_id.system_id.clone();
    image.csp_custom_image_name = resp.i_id.name_id.clone();
    image.status = ResourceStatus::Available;
    put_as(ctx, ns_id, ResourceKind::CustomImage, &image.id, &image).await?;
    register_labels(
        ctx,
        &ResourceKind::CustomImage.to_string(),
        &image.uuid,
        &keys::resource_key(ns_id, ResourceKind::CustomImage, &image.id),
        &[("sys.id", &image.id), ("sys.nsId", ns_id)],
    )
    .await?;

    let mut disks = Vec::with_capacity(resp.data_disk_iid_list.len());
    for (i, disk_iid) in resp.data_disk_iid_list.iter().enumerate() {
        let disk = DataDiskInfo {
            id: format!("{}-disk-{}", req.name, i + 1),
            uuid: gen_uid(),
            name: format!("{}-disk-{}", req.name, i + 1),
            connection_name: vm.connection_name.clone(),
            description: format!("captured with snapshot of VM {}", vm.id),
            status: ResourceStatus::Available,
            csp_data_disk_id: disk_iid.system_id.clone(),
            csp_data_disk_name: disk_iid.name_id.clone(),
            ..Default::default()
        };
        put_as(ctx, ns_id, ResourceKind::DataDisk, &disk.id, &disk).await?;
        register_labels(
            ctx,
            &ResourceKind::DataDisk.to_string(),
            &disk.uuid,
            &keys::resource_key(ns_id, ResourceKind::DataDisk, &disk.id),
            &[("sys.id", &disk.id), ("sys.nsId", ns_id)],
        )
        .await?;
        disks.push(disk);
    }

    Ok(VmSnapshotResult {
        custom_image: image,
        data_disks: disks,
    })
}
