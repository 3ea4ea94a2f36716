// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Namespace management. A namespace owns its whole `/ns/<ns>/…` subtree
//! and can only be deleted once that subtree is empty.

use chrono::Utc;

use mci_types::common::{IdList, NsInfo, NsReq, SimpleMsg};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::register_labels;
use crate::util::{check_name, gen_uid};

pub async fn create_ns(ctx: &ApiContext, req: NsReq) -> Result<NsInfo, ApiError> {
    check_name(&req.name)?;
    let key = keys::ns_key(&req.name);
    if ctx.store.exists(&key).await {
        return Err(ApiError::Conflict(format!(
            "already exists, namespace: {}",
            req.name
        )));
    }

    let info = NsInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        description: req.description,
        created_at: Utc::now().to_rfc3339(),
    };
    ctx.store.put(&key, &serde_json::to_string(&info)?).await?;
    register_labels(ctx, "ns", &info.uuid, &key, &[("sys.id", &info.id)]).await?;

    Ok(info)
}

pub async fn get_ns(ctx: &ApiContext, ns_id: &str) -> Result<NsInfo, ApiError> {
    check_name(ns_id)?;
    let raw = ctx
        .store
        .get(&keys::ns_key(ns_id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("namespace not found: {ns_id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

pub async fn list_ns(ctx: &ApiContext) -> Result<IdList, ApiError> {
    let entries = kvstore::filter_by_depth(ctx.store.list("/ns/").await, "/ns", 1);
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let info: NsInfo = serde_json::from_str(&entry.value)?;
        ids.push(info.id);
    }
    Ok(IdList { id_list: ids })
}

pub async fn update_ns(ctx: &ApiContext, ns_id: &str, req: NsReq) -> Result<NsInfo, ApiError> {
    let mut info = get_ns(ctx, ns_id).await?;
    info.description = req.description;
    ctx.store
        .put(&keys::ns_key(ns_id), &serde_json::to_string(&info)?)
        .await?;
    Ok(info)
}

pub async fn delete_ns(ctx: &ApiContext, ns_id: &str) -> Result<SimpleMsg, ApiError> {
    let info = get_ns(ctx, ns_id).await?;

    // the namespace must be empty: nothing may remain under /ns/<ns>/
    let children = ctx.store.list(&format!("/ns/{ns_id}/")).await;
    if !children.is_empty() {
        return Err(ApiError::Conflict(format!(
            "the namespace ({ns_id}) is not empty; it still owns {} object(s)",
            children.len()
        )));
    }

    ctx.store.delete(&keys::ns_key(ns_id)).await?;
    ctx.labels.remove_entity("ns", &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the namespace ({ns_id}) has been deleted"
    )))
}

pub async fn check_ns(ctx: &ApiContext, ns_id: &str) -> Result<bool, ApiError> {
    check_name(ns_id)?;
    Ok(ctx.store.exists(&keys::ns_key(ns_id)).await)
}
