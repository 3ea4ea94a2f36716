// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Multi-Cloud Infrastructure Manager
//!
//! A control plane that exposes a uniform REST API for creating,
//! inspecting, and destroying cloud resources across many providers and
//! regions. Logical entities (namespaces, vNets with subnets, MCIs with
//! VMs and subgroups) are decomposed into per-connection operations,
//! dispatched in parallel to a downstream cloud-abstraction broker, and
//! reconciled back into a durable keyed model.

pub mod broker;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod keyring;
pub mod keys;
pub mod mci;
pub mod ratelimit;
pub mod registry;
pub mod requests;
pub mod resource;
pub mod util;

pub use handlers::api_description;
