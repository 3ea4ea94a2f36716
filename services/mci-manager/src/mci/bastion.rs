// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Bastion wiring between VMs of an MCI.
//!
//! The reference edge `target → bastion` is many-to-one and stored on the
//! target VM's record. Cycles are forbidden: a VM cannot be its own
//! bastion and two VMs cannot bastion each other.

use mci_types::common::SimpleMsg;
use mci_types::mci::BastionInfo;

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::mci::{load_vm, load_vms};
use crate::resource::ensure_ns;

pub async fn set_bastion(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    target_vm_id: &str,
    bastion_vm_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    if target_vm_id == bastion_vm_id {
        return Err(ApiError::Validation(format!(
            "the VM ({target_vm_id}) cannot be its own bastion"
        )));
    }

    let mut target = load_vm(ctx, ns_id, mci_id, target_vm_id).await?;
    let bastion = load_vm(ctx, ns_id, mci_id, bastion_vm_id).await?;

    if bastion.bastion_ref == target_vm_id {
        return Err(ApiError::Validation(format!(
            "cycle rejected: the VM ({bastion_vm_id}) is already reached through ({target_vm_id})"
        )));
    }

    target.bastion_ref = bastion_vm_id.to_string();
    ctx.store
        .put(
            &keys::vm_key(ns_id, mci_id, target_vm_id),
            &serde_json::to_string(&target)?,
        )
        .await?;

    Ok(SimpleMsg::new(format!(
        "the VM ({bastion_vm_id}) is now the bastion of ({target_vm_id})"
    )))
}

pub async fn get_bastion(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    target_vm_id: &str,
) -> Result<BastionInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let target = load_vm(ctx, ns_id, mci_id, target_vm_id).await?;
    Ok(BastionInfo {
        bastion_vm_id: target.bastion_ref,
    })
}

/// Clear every reference to a bastion VM. Returns how many were cleared.
pub async fn remove_bastion(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    bastion_vm_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    load_vm(ctx, ns_id, mci_id, bastion_vm_id).await?;

    let mut cleared = 0usize;
    for mut vm in load_vms(ctx, ns_id, mci_id).await? {
        if vm.bastion_ref == bastion_vm_id {
            vm.bastion_ref.clear();
            ctx.store
                .put(
                    &keys::vm_key(ns_id, mci_id, &vm.id),
                    &serde_json::to_string(&vm)?,
                )
                .await?;
            cleared += 1;
        }
    }

    Ok(SimpleMsg::new(format!(
        "cleared {cleared} bastion reference(s) to the VM ({bastion_vm_id})"
    )))
}
