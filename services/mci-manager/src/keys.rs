// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Canonical store key layout.
//!
//! ```text
//! /ns/<ns>
//! /ns/<ns>/mci/<mci>
//! /ns/<ns>/mci/<mci>/vm/<vm>
//! /ns/<ns>/mci/<mci>/subgroup/<sg>
//! /ns/<ns>/mci/<mci>/vpn/<vpn>
//! /ns/<ns>/policy/mci/<mci>
//! /ns/<ns>/resources/<kind>/<id>
//! /ns/<ns>/resources/vNet/<vnet>/subnet/<subnet>
//! /connection/<configName>
//! /credentialHolder/<holder>
//! /label/<kind>/<uuid>
//! /request/<reqId>
//! ```
//!
//! External tooling and the tests depend on this layout; do not change the
//! segment names.

use mci_types::common::ResourceKind;

pub fn ns_key(ns_id: &str) -> String {
    format!("/ns/{ns_id}")
}

pub fn mci_key(ns_id: &str, mci_id: &str) -> String {
    format!("/ns/{ns_id}/mci/{mci_id}")
}

pub fn vm_key(ns_id: &str, mci_id: &str, vm_id: &str) -> String {
    format!("/ns/{ns_id}/mci/{mci_id}/vm/{vm_id}")
}

pub fn subgroup_key(ns_id: &str, mci_id: &str, subgroup_id: &str) -> String {
    format!("/ns/{ns_id}/mci/{mci_id}/subgroup/{subgroup_id}")
}

pub fn vpn_key(ns_id: &str, mci_id: &str, vpn_id: &str) -> String {
    format!("/ns/{ns_id}/mci/{mci_id}/vpn/{vpn_id}")
}

pub fn policy_key(ns_id: &str, mci_id: &str) -> String {
    format!("/ns/{ns_id}/policy/mci/{mci_id}")
}

pub fn resource_key(ns_id: &str, kind: ResourceKind, resource_id: &str) -> String {
    format!("/ns/{ns_id}/resources/{kind}/{resource_id}")
}

/// Subnets are the one child resource kind; they live under their vNet.
pub fn subnet_key(ns_id: &str, vnet_id: &str, subnet_id: &str) -> String {
    format!(
        "/ns/{ns_id}/resources/{}/{vnet_id}/{}/{subnet_id}",
        ResourceKind::VNet,
        ResourceKind::Subnet
    )
}

pub fn connection_key(config_name: &str) -> String {
    format!("/connection/{config_name}")
}

pub fn credential_holder_key(holder: &str) -> String {
    format!("/credentialHolder/{holder}")
}

pub fn request_key(req_id: &str) -> String {
    format!("/request/{req_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_canonical() {
        assert_eq!(ns_key("default"), "/ns/default");
        assert_eq!(mci_key("default", "m1"), "/ns/default/mci/m1");
        assert_eq!(vm_key("default", "m1", "g1-1"), "/ns/default/mci/m1/vm/g1-1");
        assert_eq!(
            subgroup_key("default", "m1", "g1"),
            "/ns/default/mci/m1/subgroup/g1"
        );
        assert_eq!(policy_key("default", "m1"), "/ns/default/policy/mci/m1");
        assert_eq!(
            resource_key("default", ResourceKind::VNet, "vnet1"),
            "/ns/default/resources/vNet/vnet1"
        );
        assert_eq!(
            subnet_key("default", "vnet1", "sn1"),
            "/ns/default/resources/vNet/vnet1/subnet/sn1"
        );
        assert_eq!(connection_key("aws-us-east-1"), "/connection/aws-us-east-1");
        assert_eq!(credential_holder_key("admin"), "/credentialHolder/admin");
    }
}
