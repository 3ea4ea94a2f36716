// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Namespaced resource management.
//!
//! Every resource kind follows one contract: validate the namespace and
//! name, reject duplicate ids, persist the entity in its intent state
//! under its canonical key, call the broker, reconcile CSP identifiers on
//! success (matching children by UUID-as-NameId, never by list order),
//! and leave the matching `ErrorOn…` state on failure. Deletion blocks on
//! dependents unless a cascade was requested.

pub mod datadisk;
pub mod image;
pub mod ns;
pub mod secgroup;
pub mod spec;
pub mod sshkey;
pub mod vnet;

use serde::de::DeserializeOwned;
use serde::Serialize;

use mci_types::common::ResourceKind;

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::util::check_name;

/// Validate a namespace id and require the namespace to exist.
pub async fn ensure_ns(ctx: &ApiContext, ns_id: &str) -> Result<(), ApiError> {
    check_name(ns_id)?;
    if !ctx.store.exists(&keys::ns_key(ns_id)).await {
        return Err(ApiError::NotFound(format!("namespace not found: {ns_id}")));
    }
    Ok(())
}

/// Whether a resource id is taken in the namespace.
pub async fn exists(ctx: &ApiContext, ns_id: &str, kind: ResourceKind, id: &str) -> bool {
    ctx.store.exists(&keys::resource_key(ns_id, kind, id)).await
}

/// Load a resource, decoding its stored JSON.
pub async fn get_as<T: DeserializeOwned>(
    ctx: &ApiContext,
    ns_id: &str,
    kind: ResourceKind,
    id: &str,
) -> Result<T, ApiError> {
    let raw = ctx
        .store
        .get(&keys::resource_key(ns_id, kind, id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("{kind} not found: {id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Persist a resource under its canonical key.
pub async fn put_as<T: Serialize>(
    ctx: &ApiContext,
    ns_id: &str,
    kind: ResourceKind,
    id: &str,
    value: &T,
) -> Result<(), ApiError> {
    ctx.store
        .put(
            &keys::resource_key(ns_id, kind, id),
            &serde_json::to_string(value)?,
        )
        .await?;
    Ok(())
}

/// List all resources of a kind in a namespace (children excluded).
pub async fn list_as<T: DeserializeOwned>(
    ctx: &ApiContext,
    ns_id: &str,
    kind: ResourceKind,
) -> Result<Vec<T>, ApiError> {
    let prefix = format!("/ns/{ns_id}/resources/{kind}");
    let entries = kvstore::filter_by_depth(ctx.store.list(&prefix).await, &prefix, 1);
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        out.push(serde_json::from_str(&entry.value)?);
    }
    Ok(out)
}

/// Remove a resource's key and its label record.
pub async fn delete_entry(
    ctx: &ApiContext,
    ns_id: &str,
    kind: ResourceKind,
    id: &str,
    uuid: &str,
) -> Result<(), ApiError> {
    ctx.store
        .delete(&keys::resource_key(ns_id, kind, id))
        .await?;
    ctx.labels.remove_entity(&kind.to_string(), uuid).await?;
    Ok(())
}

/// Register the system labels of a freshly created entity.
pub async fn register_labels(
    ctx: &ApiContext,
    label_kind: &str,
    uuid: &str,
    resource_key: &str,
    extra: &[(&str, &str)],
) -> Result<(), ApiError> {
    let mut labels = std::collections::BTreeMap::new();
    labels.insert("sys.uuid".to_string(), uuid.to_string());
    for (k, v) in extra {
        labels.insert(k.to_string(), v.to_string());
    }
    ctx.labels
        .put_labels(label_kind, uuid, resource_key, labels)
        .await?;
    Ok(())
}
