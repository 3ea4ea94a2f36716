// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Multi-cloud infrastructure orchestration.
//!
//! An MCI is a set of VMs managed as one unit. Creation expands VM
//! templates into subgroups and dispatches one broker call per VM in
//! parallel; reads with `option=status` refresh every VM from the broker
//! under a deadline; scale-out replays a subgroup's stored template.
//! Per-VM failures ride on the VM entries and never fail the batch.

pub mod bastion;
pub mod policy;
pub mod snapshot;
pub mod vpn;

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use mci_types::common::{IdList, ResourceKind, SimpleMsg};
use mci_types::mci::{
    ControlAction, MciCmdReq, MciDynamicReq, MciFanoutResponse, MciInfo, SubGroupInfo,
    VmDynamicReq, VmFanoutResult, VmInfo,
};
use mci_types::net::{
    FirewallRule, ImageInfo, SecurityGroupInfo, SecurityGroupReq, SpecInfo, SshKeyInfo, SshKeyReq,
    SubnetReq, VNetInfo, VNetReq,
};

use crate::broker::{BrokerClient, SpiderCommandReqInfo, SpiderVmReqInfo};
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::resource::{self, ensure_ns, get_as, register_labels};
use crate::util::{check_name, gen_uid};
use kvstore::{LabelIndex, Store};

/// Hard cap on concurrent broker dispatches per MCI operation.
const FANOUT_WORKERS: usize = 32;

/// MCI-level statuses derived from the VM set.
const STATUS_CONFIGURING: &str = "Configuring";
const STATUS_RUNNING: &str = "Running";
const STATUS_PARTIAL: &str = "Partial";
const STATUS_FAILED: &str = "Failed";

// ============================================================================
// Loading and assembly
// ============================================================================

async fn load_mci_record(ctx: &ApiContext, ns_id: &str, mci_id: &str) -> Result<MciInfo, ApiError> {
    let raw = ctx
        .store
        .get(&keys::mci_key(ns_id, mci_id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("MCI not found: {mci_id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

pub async fn load_vms(ctx: &ApiContext, ns_id: &str, mci_id: &str) -> Result<Vec<VmInfo>, ApiError> {
    let prefix = format!("{}/vm/", keys::mci_key(ns_id, mci_id));
    let mut vms = Vec::new();
    for entry in ctx.store.list(&prefix).await {
        vms.push(serde_json::from_str::<VmInfo>(&entry.value)?);
    }
    Ok(vms)
}

pub async fn load_vm(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vm_id: &str,
) -> Result<VmInfo, ApiError> {
    let raw = ctx
        .store
        .get(&keys::vm_key(ns_id, mci_id, vm_id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("VM not found: {vm_id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

async fn persist_vm(store: &Store, ns_id: &str, mci_id: &str, vm: &VmInfo) -> Result<(), ApiError> {
    store
        .put(&keys::vm_key(ns_id, mci_id, vm.id.as_str()), &serde_json::to_string(vm)?)
        .await?;
    Ok(())
}

fn derive_status(vms: &[VmInfo]) -> String {
    if vms.is_empty() {
        return STATUS_CONFIGURING.to_string();
    }
    let failed = vms
        .iter()
        .filter(|vm| vm.status.starts_with("ErrorOn"))
        .count();
    if failed == 0 {
        STATUS_RUNNING.to_string()
    } else if failed == vms.len() {
        STATUS_FAILED.to_string()
    } else {
        STATUS_PARTIAL.to_string()
    }
}

// ============================================================================
// Shared default resources
// ============================================================================

fn shared_id(connection_name: &str, suffix: &str) -> String {
    format!("shared-{connection_name}-{suffix}")
}

async fn ensure_shared_vnet(
    ctx: &ApiContext,
    ns_id: &str,
    connection_name: &str,
) -> Result<VNetInfo, ApiError> {
    let id = shared_id(connection_name, "vnet");
    if resource::exists(ctx, ns_id, ResourceKind::VNet, &id).await {
        return get_as(ctx, ns_id, ResourceKind::VNet, &id).await;
    }
    resource::vnet::create_vnet(
        ctx,
        ns_id,
        VNetReq {
            name: id,
            connection_name: connection_name.to_string(),
            cidr_block: "10.0.0.0/16".into(),
            description: "Shared default vNet".into(),
            subnet_info_list: vec![SubnetReq {
                name: shared_id(connection_name, "subnet"),
                ipv4_cidr: "10.0.1.0/24".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )
    .await
}

async fn ensure_shared_sg(
    ctx: &ApiContext,
    ns_id: &str,
    connection_name: &str,
    vnet_id: &str,
) -> Result<SecurityGroupInfo, ApiError> {
    let id = shared_id(connection_name, "sg");
    if resource::exists(ctx, ns_id, ResourceKind::SecurityGroup, &id).await {
        return get_as(ctx, ns_id, ResourceKind::SecurityGroup, &id).await;
    }
    resource::secgroup::create_security_group(
        ctx,
        ns_id,
        SecurityGroupReq {
            name: id,
            connection_name: connection_name.to_string(),
            v_net_id: vnet_id.to_string(),
            description: "Shared default security group".into(),
            firewall_rules: vec![FirewallRule {
                direction: "inbound".into(),
                protocol: "tcp".into(),
                from_port: "22".into(),
                to_port: "22".into(),
                cidr: "0.0.0.0/0".into(),
            }],
        },
    )
    .await
}

async fn ensure_shared_ssh_key(
    ctx: &ApiContext,
    ns_id: &str,
    connection_name: &str,
) -> Result<SshKeyInfo, ApiError> {
    let id = shared_id(connection_name, "sshkey");
    if resource::exists(ctx, ns_id, ResourceKind::SshKey, &id).await {
        return get_as(ctx, ns_id, ResourceKind::SshKey, &id).await;
    }
    resource::sshkey::create_ssh_key(
        ctx,
        ns_id,
        SshKeyReq {
            name: id,
            connection_name: connection_name.to_string(),
            description: "Shared default SSH key".into(),
        },
    )
    .await
}

// ============================================================================
// VM dispatch
// ============================================================================

/// Everything a single VM dispatch needs, resolved before the fan-out.
#[derive(Clone)]
struct VmLaunchPlan {
    connection_name: String,
    vnet_csp_name: String,
    subnet_csp_name: String,
    sg_csp_names: Vec<String>,
    key_csp_name: String,
    spec_csp_name: String,
    image_csp_name: String,
    root_disk_type: String,
    root_disk_size: String,
}

/// Dispatch one VM create to the broker and reconcile the response into
/// the persisted record. The record is written before and after the call;
/// a broker failure leaves `ErrorOnConfiguring` with the message on the
/// VM entry.
async fn launch_vm(
    broker: BrokerClient,
    store: Store,
    labels: LabelIndex,
    ns_id: String,
    mci_id: String,
    mut vm: VmInfo,
    plan: VmLaunchPlan,
) -> VmInfo {
    let result = broker
        .create_vm(
            &plan.connection_name,
            SpiderVmReqInfo {
                name: vm.uuid.clone(),
                image_name: plan.image_csp_name.clone(),
                vpc_name: plan.vnet_csp_name.clone(),
                subnet_name: plan.subnet_csp_name.clone(),
                security_group_names: plan.sg_csp_names.clone(),
                vm_spec_name: plan.spec_csp_name.clone(),
                key_pair_name: plan.key_csp_name.clone(),
                root_disk_type: plan.root_disk_type.clone(),
                root_disk_size: plan.root_disk_size.clone(),
            },
        )
        .await;

    match result {
        Ok(resp) => {
            vm.csp_vm_id = resp.i_id.system_id;
            vm.csp_vm_name = resp.i_id.name_id;
            vm.public_ip = resp.public_ip;
            vm.private_ip = resp.private_ip;
            vm.status = STATUS_RUNNING.to_string();
            vm.key_value_list = resp.key_value_list;
        }
        Err(e) => {
            warn!(vm_id = %vm.id, error = %e, "VM creation failed");
            vm.status = "ErrorOnConfiguring".to_string();
            vm.error_message = e.to_string();
        }
    }

    if let Err(e) = persist_vm(&store, &ns_id, &mci_id, &vm).await {
        warn!(vm_id = %vm.id, error = %e, "Failed to persist VM record");
    }
    if vm.error_message.is_empty() {
        let key = keys::vm_key(&ns_id, &mci_id, &vm.id);
        let mut sys = std::collections::BTreeMap::new();
        sys.insert("sys.uuid".to_string(), vm.uuid.clone());
        sys.insert("sys.id".to_string(), vm.id.clone());
        sys.insert("sys.nsId".to_string(), ns_id.clone());
        if let Err(e) = labels.put_labels("vm", &vm.uuid, &key, sys).await {
            warn!(vm_id = %vm.id, error = %e, "Failed to register VM labels");
        }
    }
    vm
}

/// Expand one template into VM records and dispatch them in parallel.
/// Returns the final per-VM records, dispatch failures included.
async fn launch_subgroup(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    template: &VmDynamicReq,
    start_index: u32,
    count: u32,
) -> Result<Vec<VmInfo>, ApiError> {
    let spec: SpecInfo = get_as(ctx, ns_id, ResourceKind::Spec, &template.spec_id).await?;
    let image: ImageInfo = get_as(ctx, ns_id, ResourceKind::Image, &template.image_id).await?;
    let connection_name = if template.connection_name.is_empty() {
        spec.connection_name.clone()
    } else {
        template.connection_name.clone()
    };

    let vnet = ensure_shared_vnet(ctx, ns_id, &connection_name).await?;
    let sg = ensure_shared_sg(ctx, ns_id, &connection_name, &vnet.id).await?;
    let ssh_key = ensure_shared_ssh_key(ctx, ns_id, &connection_name).await?;
    let subnet = vnet
        .subnet_info_list
        .first()
        .ok_or_else(|| ApiError::Internal(format!("vNet {} has no subnet", vnet.id)))?
        .clone();

    let plan = VmLaunchPlan {
        connection_name: connection_name.clone(),
        vnet_csp_name: vnet.csp_v_net_name.clone(),
        subnet_csp_name: subnet.csp_subnet_name.clone(),
        sg_csp_names: vec![sg.csp_security_group_name.clone()],
        key_csp_name: ssh_key.csp_ssh_key_name.clone(),
        spec_csp_name: spec.csp_spec_name.clone(),
        image_csp_name: image.csp_image_name.clone(),
        root_disk_type: template.root_disk_type.clone(),
        root_disk_size: template.root_disk_size.clone(),
    };

    let semaphore = Arc::new(Semaphore::new(FANOUT_WORKERS));
    let mut handles = Vec::with_capacity(count as usize);
    for i in 0..count {
        let vm = VmInfo {
            id: format!("{}-{}", template.name, start_index + i),
            uuid: gen_uid(),
            name: format!("{}-{}", template.name, start_index + i),
            connection_name: connection_name.clone(),
            status: STATUS_CONFIGURING.to_string(),
            sg_ids: vec![sg.id.clone()],
            v_net_id: vnet.id.clone(),
            subnet_id: subnet.id.clone(),
            ssh_key_id: ssh_key.id.clone(),
            image_id: template.image_id.clone(),
            spec_id: template.spec_id.clone(),
            sub_group_id: template.name.clone(),
            ..Default::default()
        };
        persist_vm(&ctx.store, ns_id, mci_id, &vm).await?;

        let broker = ctx.broker.clone();
        let store = ctx.store.clone();
        let labels = ctx.labels.clone();
        let semaphore = Arc::clone(&semaphore);
        let plan = plan.clone();
        let (ns_id, mci_id) = (ns_id.to_string(), mci_id.to_string());
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await;
            launch_vm(broker, store, labels, ns_id, mci_id, vm, plan).await
        }));
    }

    let mut vms = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(vm) => vms.push(vm),
            Err(e) => return Err(ApiError::Internal(format!("VM dispatch panicked: {e}"))),
        }
    }
    Ok(vms)
}

// ============================================================================
// MCI operations
// ============================================================================

/// Create an MCI from VM templates.
pub async fn create_mci_dynamic(
    ctx: &ApiContext,
    ns_id: &str,
    req: MciDynamicReq,
) -> Result<MciInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(&req.name)?;
    if ctx.store.exists(&keys::mci_key(ns_id, &req.name)).await {
        return Err(ApiError::Conflict(format!(
            "already exists, MCI: {}",
            req.name
        )));
    }
    if req.vm.is_empty() {
        return Err(ApiError::Validation(
            "at least one VM template is required".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for template in &req.vm {
        check_name(&template.name)?;
        if template.sub_group_size == 0 {
            return Err(ApiError::Validation(format!(
                "subGroupSize of {} must be at least 1",
                template.name
            )));
        }
        if !seen.insert(template.name.as_str()) {
            return Err(ApiError::Validation(format!(
                "duplicate subgroup name: {}",
                template.name
            )));
        }
    }

    let mut mci = MciInfo {
        id: req.name.clone(),
        uuid: gen_uid(),
        name: req.name.clone(),
        description: req.description.clone(),
        status: STATUS_CONFIGURING.to_string(),
        sub_group_list: req.vm.iter().map(|t| t.name.clone()).collect(),
        ..Default::default()
    };
    ctx.store
        .put(&keys::mci_key(ns_id, &mci.id), &serde_json::to_string(&mci)?)
        .await?;

    let mut all_vms = Vec::new();
    for template in &req.vm {
        let vms = launch_subgroup(ctx, ns_id, &mci.id, template, 1, template.sub_group_size).await?;
        let subgroup = SubGroupInfo {
            id: template.name.clone(),
            uuid: gen_uid(),
            name: template.name.clone(),
            sub_group_size: template.sub_group_size,
            vm_id_list: vms.iter().map(|vm| vm.id.clone()).collect(),
            template: template.clone(),
        };
        ctx.store
            .put(
                &keys::subgroup_key(ns_id, &mci.id, &subgroup.id),
                &serde_json::to_string(&subgroup)?,
            )
            .await?;
        all_vms.extend(vms);
    }

    mci.status = derive_status(&all_vms);
    ctx.store
        .put(&keys::mci_key(ns_id, &mci.id), &serde_json::to_string(&mci)?)
        .await?;
    register_labels(
        ctx,
        "mci",
        &mci.uuid,
        &keys::mci_key(ns_id, &mci.id),
        &[("sys.id", &mci.id), ("sys.nsId", ns_id)],
    )
    .await?;

    info!(ns_id, mci_id = %mci.id, vms = all_vms.len(), status = %mci.status, "MCI created");
    mci.vm_list = all_vms;
    Ok(mci)
}

/// Get an MCI; with `live_status` every VM is refreshed from the broker
/// in parallel under the configured deadline. Exceeding the deadline
/// surfaces a timeout carrying the partial state; VMs that did not answer
/// in time are reported `Unknown`, and their refreshes keep running so
/// late results are still persisted on arrival.
pub async fn get_mci(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    live_status: bool,
) -> Result<MciInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(mci_id)?;
    let mut mci = load_mci_record(ctx, ns_id, mci_id).await?;
    let vms = load_vms(ctx, ns_id, mci_id).await?;

    if !live_status {
        mci.vm_list = vms;
        return Ok(mci);
    }

    let deadline = ctx.config.mci_status_deadline;
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, Option<String>)>();
    let mut refreshed: std::collections::HashMap<String, VmInfo> =
        vms.iter().map(|vm| (vm.id.clone(), vm.clone())).collect();

    let mut pending = 0usize;
    for vm in &vms {
        if vm.csp_vm_name.is_empty() {
            continue;
        }
        pending += 1;
        let broker = ctx.broker.clone();
        let store = ctx.store.clone();
        let tx = tx.clone();
        let (ns_id, mci_id, vm) = (ns_id.to_string(), mci_id.to_string(), vm.clone());
        tokio::spawn(async move {
            let status = match broker.get_vm_status(&vm.connection_name, &vm.csp_vm_name).await {
                Ok(s) => Some(s.status),
                Err(e) => {
                    warn!(vm_id = %vm.id, error = %e, "VM status refresh failed");
                    None
                }
            };
            // persist whatever arrived, even past the caller's deadline
            if let Some(status) = &status {
                let mut vm = vm.clone();
                vm.status = status.clone();
                let _ = persist_vm(&store, &ns_id, &mci_id, &vm).await;
            }
            let _ = tx.send((vm.id.clone(), status));
        });
    }
    drop(tx);

    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);
    let mut timed_out = false;
    let mut reported: std::collections::HashSet<String> = std::collections::HashSet::new();
    while pending > 0 {
        tokio::select! {
            received = rx.recv() => {
                let Some((vm_id, status)) = received else { break };
                pending -= 1;
                reported.insert(vm_id.clone());
                if let Some(entry) = refreshed.get_mut(&vm_id) {
                    match status {
                        Some(status) => entry.status = status,
                        None => entry.error_message = "status refresh failed".into(),
                    }
                }
            }
            _ = &mut timer => {
                timed_out = true;
                break;
            }
        }
    }

    let mut vm_list: Vec<VmInfo> = refreshed.into_values().collect();
    vm_list.sort_by(|a, b| a.id.cmp(&b.id));

    if timed_out {
        // VMs that did not answer before the deadline read Unknown
        for vm in vm_list.iter_mut() {
            if !vm.csp_vm_name.is_empty() && !reported.contains(&vm.id) {
                vm.status = "Unknown".to_string();
            }
        }
        mci.vm_list = vm_list;
        let partial = serde_json::to_string(&mci)?;
        return Err(ApiError::Timeout(format!(
            "MCI status fan-out exceeded {}s; partial state: {partial}",
            deadline.as_secs()
        )));
    }

    mci.status = derive_status(&vm_list);
    mci.vm_list = vm_list;
    Ok(mci)
}

pub async fn list_mci(ctx: &ApiContext, ns_id: &str) -> Result<IdList, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let prefix = format!("/ns/{ns_id}/mci");
    let entries = kvstore::filter_by_depth(ctx.store.list(&prefix).await, &prefix, 1);
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let mci: MciInfo = serde_json::from_str(&entry.value)?;
        ids.push(mci.id);
    }
    Ok(IdList { id_list: ids })
}

/// Delete an MCI: terminate and delete every VM, then remove the whole
/// subtree and the associated policy.
pub async fn delete_mci(ctx: &ApiContext, ns_id: &str, mci_id: &str) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(mci_id)?;
    let mci = load_mci_record(ctx, ns_id, mci_id).await?;
    let vms = load_vms(ctx, ns_id, mci_id).await?;

    let semaphore = Arc::new(Semaphore::new(FANOUT_WORKERS));
    let mut handles = Vec::new();
    for vm in vms {
        if vm.csp_vm_name.is_empty() {
            ctx.labels.remove_entity("vm", &vm.uuid).await?;
            continue;
        }
        let broker = ctx.broker.clone();
        let labels = ctx.labels.clone();
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await;
            if let Err(e) = broker.delete_vm(&vm.connection_name, &vm.csp_vm_name).await {
                warn!(vm_id = %vm.id, error = %e, "VM deletion failed, removing local record anyway");
            }
            let _ = labels.remove_entity("vm", &vm.uuid).await;
            vm.id
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    ctx.store
        .delete_prefix(&format!("{}/", keys::mci_key(ns_id, mci_id)))
        .await?;
    ctx.store.delete(&keys::mci_key(ns_id, mci_id)).await?;
    ctx.store.delete(&keys::policy_key(ns_id, mci_id)).await?;
    ctx.labels.remove_entity("mci", &mci.uuid).await?;

    Ok(SimpleMsg::new(format!(
        "the MCI ({mci_id}) has been deleted"
    )))
}

/// Suspend/resume/reboot/terminate every VM of an MCI.
pub async fn control_mci(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    action: ControlAction,
) -> Result<MciFanoutResponse, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    load_mci_record(ctx, ns_id, mci_id).await?;
    let vms = load_vms(ctx, ns_id, mci_id).await?;

    let semaphore = Arc::new(Semaphore::new(FANOUT_WORKERS));
    let mut handles = Vec::new();
    for vm in vms {
        let broker = ctx.broker.clone();
        let semaphore = Arc::clone(&semaphore);
        let action = action.to_string();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await;
            if vm.csp_vm_name.is_empty() {
                return VmFanoutResult {
                    vm_id: vm.id,
                    error: "VM has no CSP identifier".into(),
                    ..Default::default()
                };
            }
            match broker
                .control_vm(&vm.connection_name, &vm.csp_vm_name, &action)
                .await
            {
                Ok(result) if result.is_true() => VmFanoutResult {
                    vm_id: vm.id,
                    ..Default::default()
                },
                Ok(_) => VmFanoutResult {
                    vm_id: vm.id,
                    error: format!("broker refused {action}"),
                    ..Default::default()
                },
                Err(e) => VmFanoutResult {
                    vm_id: vm.id,
                    error: e.to_string(),
                    ..Default::default()
                },
            }
        }));
    }

    collect_fanout(handles).await
}

/// Run a command on every VM of an MCI.
pub async fn cmd_mci(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    req: MciCmdReq,
) -> Result<MciFanoutResponse, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    if req.command.is_empty() {
        return Err(ApiError::Validation("no command provided".into()));
    }
    load_mci_record(ctx, ns_id, mci_id).await?;
    let vms = load_vms(ctx, ns_id, mci_id).await?;
    let command = req.command.join("; ");

    let semaphore = Arc::new(Semaphore::new(FANOUT_WORKERS));
    let mut handles = Vec::new();
    for vm in vms {
        let broker = ctx.broker.clone();
        let semaphore = Arc::clone(&semaphore);
        let command = command.clone();
        let user_name = req.user_name.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await;
            if vm.csp_vm_name.is_empty() {
                return VmFanoutResult {
                    vm_id: vm.id,
                    error: "VM has no CSP identifier".into(),
                    ..Default::default()
                };
            }
            match broker
                .run_command(
                    &vm.connection_name,
                    SpiderCommandReqInfo {
                        vm_name: vm.csp_vm_name.clone(),
                        command,
                        user_name,
                    },
                )
                .await
            {
                Ok(result) => VmFanoutResult {
                    vm_id: vm.id,
                    stdout: result.stdout,
                    stderr: result.stderr,
                    ..Default::default()
                },
                Err(e) => VmFanoutResult {
                    vm_id: vm.id,
                    error: e.to_string(),
                    ..Default::default()
                },
            }
        }));
    }

    collect_fanout(handles).await
}

async fn collect_fanout(
    handles: Vec<tokio::task::JoinHandle<VmFanoutResult>>,
) -> Result<MciFanoutResponse, ApiError> {
    let mut response = MciFanoutResponse::default();
    for handle in handles {
        match handle.await {
            Ok(result) if result.error.is_empty() => response.results.push(result),
            Ok(result) => response.failures.push(result),
            Err(e) => {
                return Err(ApiError::Internal(format!("fan-out task panicked: {e}")));
            }
        }
    }
    response.results.sort_by(|a, b| a.vm_id.cmp(&b.vm_id));
    response.failures.sort_by(|a, b| a.vm_id.cmp(&b.vm_id));
    Ok(response)
}

// ============================================================================
// Subgroups and single VMs
// ============================================================================

pub async fn list_subgroups(ctx: &ApiContext, ns_id: &str, mci_id: &str) -> Result<IdList, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    load_mci_record(ctx, ns_id, mci_id).await?;
    let prefix = format!("{}/subgroup/", keys::mci_key(ns_id, mci_id));
    let mut ids = Vec::new();
    for entry in ctx.store.list(&prefix).await {
        let subgroup: SubGroupInfo = serde_json::from_str(&entry.value)?;
        ids.push(subgroup.id);
    }
    Ok(IdList { id_list: ids })
}

pub async fn get_subgroup(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    subgroup_id: &str,
) -> Result<SubGroupInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let raw = ctx
        .store
        .get(&keys::subgroup_key(ns_id, mci_id, subgroup_id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("subgroup not found: {subgroup_id}")))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Scale out a subgroup by `count` VMs replaying its stored template.
/// New VM ids continue the subgroup's numbering.
pub async fn scale_out_subgroup(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    subgroup_id: &str,
    count: u32,
) -> Result<MciInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    if count == 0 {
        return Err(ApiError::Validation(
            "numberOfAddedVm must be at least 1".into(),
        ));
    }
    let mut mci = load_mci_record(ctx, ns_id, mci_id).await?;
    let mut subgroup = get_subgroup(ctx, ns_id, mci_id, subgroup_id).await?;

    let next_index = subgroup
        .vm_id_list
        .iter()
        .filter_map(|id| id.rsplit('-').next()?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1;

    let new_vms =
        launch_subgroup(ctx, ns_id, mci_id, &subgroup.template, next_index, count).await?;

    subgroup
        .vm_id_list
        .extend(new_vms.iter().map(|vm| vm.id.clone()));
    subgroup.sub_group_size += count;
    ctx.store
        .put(
            &keys::subgroup_key(ns_id, mci_id, subgroup_id),
            &serde_json::to_string(&subgroup)?,
        )
        .await?;

    let vms = load_vms(ctx, ns_id, mci_id).await?;
    mci.status = derive_status(&vms);
    ctx.store
        .put(&keys::mci_key(ns_id, mci_id), &serde_json::to_string(&mci)?)
        .await?;

    info!(ns_id, mci_id, subgroup_id, added = count, "Subgroup scaled out");
    mci.vm_list = vms;
    Ok(mci)
}

pub async fn get_vm(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vm_id: &str,
) -> Result<VmInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    load_vm(ctx, ns_id, mci_id, vm_id).await
}

/// Delete one VM. A VM still serving as a bastion is protected unless
/// `force`, which clears the references first.
pub async fn delete_vm(
    ctx: &ApiContext,
    ns_id: &str,
    mci_id: &str,
    vm_id: &str,
    force: bool,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let vm = load_vm(ctx, ns_id, mci_id, vm_id).await?;

    let dependents: Vec<VmInfo> = load_vms(ctx, ns_id, mci_id)
        .await?
        .into_iter()
        .filter(|other| other.bastion_ref == vm_id)
        .collect();
    if !dependents.is_empty() {
        if !force {
            return Err(ApiError::Conflict(format!(
                "the VM ({vm_id}) is a bastion for: {}",
                dependents
                    .iter()
                    .map(|d| d.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        for mut dependent in dependents {
            dependent.bastion_ref.clear();
            persist_vm(&ctx.store, ns_id, mci_id, &dependent).await?;
        }
    }

    if !vm.csp_vm_name.is_empty() {
        if let Err(e) = ctx.broker.delete_vm(&vm.connection_name, &vm.csp_vm_name).await {
            let mut vm = vm.clone();
            vm.status = "ErrorOnDeleting".to_string();
            persist_vm(&ctx.store, ns_id, mci_id, &vm).await?;
            return Err(e.into());
        }
    }

    ctx.store.delete(&keys::vm_key(ns_id, mci_id, vm_id)).await?;
    ctx.labels.remove_entity("vm", &vm.uuid).await?;

    // drop the VM from its subgroup record
    if !vm.sub_group_id.is_empty() {
        if let Ok(mut subgroup) = get_subgroup(ctx, ns_id, mci_id, &vm.sub_group_id).await {
            subgroup.vm_id_list.retain(|id| id != vm_id);
            ctx.store
                .put(
                    &keys::subgroup_key(ns_id, mci_id, &subgroup.id),
                    &serde_json::to_string(&subgroup)?,
                )
                .await?;
        }
    }

    Ok(SimpleMsg::new(format!("the VM ({vm_id}) has been deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(id: &str, status: &str) -> VmInfo {
        VmInfo {
            id: id.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    #[test]
    fn mci_status_derivation() {
        assert_eq!(derive_status(&[]), "Configuring");
        assert_eq!(
            derive_status(&[vm("a", "Running"), vm("b", "Running")]),
            "Running"
        );
        assert_eq!(
            derive_status(&[vm("a", "Running"), vm("b", "ErrorOnConfiguring")]),
            "Partial"
        );
        assert_eq!(
            derive_status(&[vm("a", "ErrorOnConfiguring")]),
            "Failed"
        );
    }

    #[test]
    fn shared_resource_ids() {
        assert_eq!(shared_id("aws-us-east-1", "vnet"), "shared-aws-us-east-1-vnet");
    }
}
