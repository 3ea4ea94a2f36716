// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! VM spec lookups.
//!
//! Lookups are pass-throughs to the broker, cached in the store so later
//! reads and range filtering need no broker traffic. Cached spec ids are
//! `<connection>-<cspSpecName>` normalized to the id character set.

use mci_types::common::{IdList, ResourceKind, SimpleMsg};
use mci_types::net::{FilterSpecsByRangeReq, SpecInfo};

use crate::broker::SpiderVmSpecInfo;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::keys;
use crate::registry;
use crate::resource::{delete_entry, ensure_ns, get_as, list_as, put_as, register_labels};
use crate::util::{change_id_string, check_name, gen_uid};
use mci_types::common::lookup_key_value_list;

const KIND: ResourceKind = ResourceKind::Spec;

fn to_spec_info(connection_name: &str, conn_provider: &str, region: &str, sp: &SpiderVmSpecInfo) -> SpecInfo {
    let mem_mib: f32 = sp.mem.trim().parse().unwrap_or(0.0);
    let cost: f32 = lookup_key_value_list(&sp.key_value_list, "CostPerHour")
        .parse()
        .unwrap_or(0.0);
    SpecInfo {
        id: change_id_string(&format!("{connection_name}-{}", sp.name)),
        uuid: gen_uid(),
        name: sp.name.clone(),
        connection_name: connection_name.to_string(),
        provider_name: conn_provider.to_string(),
        region_name: region.to_string(),
        csp_spec_name: sp.name.clone(),
        v_cpu: sp.v_cpu.count.trim().parse().unwrap_or(0),
        memory_gib: mem_mib / 1024.0,
        cost_per_hour: cost,
    }
}

/// Fetch every spec visible through a connection into the cache.
pub async fn fetch_specs(
    ctx: &ApiContext,
    ns_id: &str,
    connection_name: &str,
) -> Result<IdList, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let conn = registry::get_conn_config(ctx, connection_name).await?;

    let specs = ctx.broker.list_vm_specs(connection_name).await?;
    let mut ids = Vec::with_capacity(specs.len());
    for sp in &specs {
        let info = to_spec_info(
            connection_name,
            &conn.provider_name,
            &conn.region_detail.region_id,
            sp,
        );
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

/// Apply numeric range predicates over the cached specs.
pub async fn filter_specs_by_range(
    ctx: &ApiContext,
    ns_id: &str,
    req: &FilterSpecsByRangeReq,
) -> Result<Vec<SpecInfo>, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    let specs: Vec<SpecInfo> = list_as(ctx, ns_id, KIND).await?;
    Ok(specs
        .into_iter()
        .filter(|s| {
            req.v_cpu.map_or(true, |r| r.contains(s.v_cpu as f32))
                && req.memory_gib.map_or(true, |r| r.contains(s.memory_gib))
                && req.cost_per_hour.map_or(true, |r| r.contains(s.cost_per_hour))
        })
        .collect())
}

pub async fn get_spec(ctx: &ApiContext, ns_id: &str, spec_id: &str) -> Result<SpecInfo, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(spec_id)?;
    get_as(ctx, ns_id, KIND, spec_id).await
}

pub async fn delete_spec(
    ctx: &ApiContext,
    ns_id: &str,
    spec_id: &str,
) -> Result<SimpleMsg, ApiError> {
    ensure_ns(ctx, ns_id).await?;
    check_name(spec_id)?;
    let info: SpecInfo = get_as(ctx, ns_id, KIND, spec_id).await?;
    delete_entry(ctx, ns_id, KIND, spec_id, &info.uuid).await?;
    Ok(SimpleMsg::new(format!(
        "the spec ({spec_id}) has been deleted"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::SpiderVCpuInfo;
    use mci_types::common::KeyValue;

    #[test]
    fn spec_conversion_normalizes_ids_and_units() {
        let sp = SpiderVmSpecInfo {
            name: "t3.large".into(),
            v_cpu: SpiderVCpuInfo {
                count: "2".into(),
                clock: "2.5".into(),
            },
            mem: "8192".into(),
            key_value_list: vec![KeyValue::new("CostPerHour", "0.0832")],
        };
        let info = to_spec_info("aws-us-east-1", "aws", "us-east-1", &sp);
        assert_eq!(info.id, "aws-us-east-1-t3-large");
        assert_eq!(info.v_cpu, 2);
        assert_eq!(info.memory_gib, 8.0);
        assert!((info.cost_per_hour - 0.0832).abs() < f32::EPSILON);
    }
}
