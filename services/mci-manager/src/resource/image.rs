// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Machine images and custom images.
//!
//! Plain images are broker lookups cached into the store, like specs.
//! Custom images are created by VM snapshots and own a broker-side
//! resource that is destroyed with them.

use mci_types::common::{IdList, ResourceKind, ResourceStatus, SimpleMsg};
use mci_types::net::{CustomImageInfo, ImageInfo};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::{delete_entry, ensure_ns, get_as, put_as, register_labels};
use crate::util::{change_id_string, check_name, gen_uid};

const KIND: ResourceKind = ResourceKind::Image;
const CUSTOM: ResourceKind = ResourceKind::CustomImage;

/// Fetch every image visible through a connection into the cache.
pub async fn fetch_images(
    ctx: &ApiContext,
    ns_id: &str,
    connection_name: &str,
) -> Result<IdList, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    crate::registry::get_conn_config(ctx, connection_name).await?;

    let images = ctx.broker.list_vm_images(connection_name).await?;
    let mut ids = Vec::with_capacity(images.len());
    for img in &images {
        let info = ImageInfo {
            id: change_id_string(&format!("{connection_name}-{}", img.i_id.name_id)),
            uuid: gen_uid(),
            name: img.i_id.name_id.clone(),
            connection_name: connection_name.to_string(),
            csp_image_id: img.i_id.system_id.clone(),
            csp_image_name: img.i_id.name_id.clone(),
            guest_os: img.guest_os.clone(),
            status: ResourceStatus::Available,
            ..Default::default()
        };
        put_as(ctx, ns_id, KIND, &info.id, &info).await?;
        register_labels(
            ctx,
            &KIND.to_string(),
            &info.uuid,
            &keys::resource_key(ns_id, KIND, &info.id),
            &[("sys.id", &info.id), ("sys.nsId", ns_id)],
        )
        .await?;
        ids.push(info.id);
    }
    Ok(IdList { id_list: ids })
}

pub async fn get_image(ctx: &ApiContext, ns_id: &str, image_id: &str) -> Result<ImageInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(image_id)?;
    get_as(ctx, ns_id, KIND, image_id).await
}

pub async fn delete_image(
    ctx: &ApiContext,
    ns_id: &str,
    image_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(image_id)?;
    let info: ImageInfo = get_as(ctx, ns_id, KIND, image_id).await?;
    delete_entry(ctx, ns_id, KIND, image_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the image ({image_id}) has been deleted"
    )))
}

pub async fn get_custom_image(
    ctx: &ApiContext,
    ns_id: &str,
    image_id: &str,
) -> Result<CustomImageInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(image_id)?;
    get_as(ctx, ns_id, CUSTOM, image_id).await
}

pub async fn delete_custom_image(
    ctx: &ApiContext,
    ns_id: &str,
    image_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(image_id)?;
    let mut info: CustomImageInfo = get_as(ctx, ns_id, CUSTOM, image_id).await?;

    info.status = ResourceStatus::Deleting;
    put_as(ctx, ns_id, CUSTOM, image_id, &info).await?;

    match ctx
        .broker
        .delete_my_image(&info.connection_name, &info.csp_custom_image_name)
        .await
    {
        Ok(result) if result.is_true() => {}
        Ok(_) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, CUSTOM, image_id, &info).await?;
            return Err(ApiError::Internal(format!(
                "failed to delete the customImage ({image_id})"
            )));
        }
        Err(e) => {
            info.status = ResourceStatus::ErrorOnDeleting;
            put_as(ctx, ns_id, CUSTOM, image_id, &info).await?;
            return Err(e.into());
        }
    }

    delete_entry(ctx, ns_id, CUSTOM, image_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the customImage ({image_id}) has been deleted"
    )))
}
