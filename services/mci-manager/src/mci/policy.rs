// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Autoscaling policies. Stored verbatim under
//! `/ns/<ns>/policy/mci/<mci>`; an external loop evaluates them, the
//! manager never does.

use mci_types::common::SimpleMsg;
use mci_types::mci::{MciInfo, MciPolicyInfo};

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::ensure_ns;

pub async fn put_policy(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    policy: serde_json::Value,
) -> Result<MciPolicyInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let mci_key = keys::mci_key(ns_id, mci_id);
    let raw = ctx
        .store
        .get(&mci_key)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("MCI not found: {mci_id}")))?;

    let info = MciPolicyInfo {
        mci_id: mci_id.to_string(),
        policy,
    };
    ctx.store
        .put(&keys::policy_key(ns_id, mci_id), &serde_json::to_string(&info)?)
        .await?;

    // back-reference on the MCI record
    let mut mci: MciInfo = serde_json::from_str(&raw)?;
    mci.associated_policy_id = mci_id.to_string();
    ctx.store.put(&mci_key, &serde_json::to_string(&mci)?).await?;

    Ok(info)
}

pub async fn get_policy(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
) -> Result<MciPolicyInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let raw = ctx
        .store
        .get(&keys::policy_key(ns_id, mci_id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no policy for MCI: {mci_id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

pub async fn delete_policy(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let key = keys::policy_key(ns_id, mci_id);
    if ctx.store.get(&key).await.is_none() {
        return Err(ApiError::NotFound(format!("no policy for MCI: {mci_id}")));
    }
    ctx.store.delete(&key).await?;

    if let Some(raw) = ctx.store.get(&keys::mci_key(ns_id, mci_id)).await {
        let mut mci: MciInfo = serde_json::from_str(&raw)?;
        mci.associated_policy_id.clear();
        ctx.store
            .put(&keys::mci_key(ns_id, mci_id), &serde_json::to_string(&mci)?)
            .await?;
    }

    Ok(SimpleMsg::new(format!(
        "the policy for MCI ({mci_id}) has been deleted"
    )))
}
