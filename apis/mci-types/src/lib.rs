// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Shared types for the multi-cloud infrastructure manager.
//!
//! This crate contains the data model shared by the manager service, its
//! API trait, and consumers: namespaces, connection configurations, the
//! composite network/compute resources, and the request/response bodies of
//! the HTTP surface.
//!
//! Two serialization conventions coexist on purpose. Entities that are
//! persisted in the keyed store and mirrored to external tooling use
//! PascalCase field names (with a handful of historical spellings such as
//! `IPv4_CIDR` and `PublicIP`); operational request/response bodies use
//! camelCase. Both are part of the wire contract and must not drift.

pub mod catalog;
pub mod common;
pub mod conn;
pub mod mci;
pub mod net;
pub mod request;

pub use catalog::{CloudCatalog, K8sCatalog, ProviderDetail, RegionDetail};
pub use common::{IdList, KeyValue, NsInfo, NsReq, ResourceKind, ResourceStatus, SimpleMsg};
pub use conn::{ConnConfig, ConnConfigList, CredentialInfo, CredentialReq, PublicKeyResponse};
