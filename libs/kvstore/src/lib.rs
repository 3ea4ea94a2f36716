// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Durable hierarchical key/value store and label index.
//!
//! Every entity of the control plane lives under a slash-separated key
//! (`/ns/<ns>/resources/vNet/<id>`, `/connection/<name>`, …) as one JSON
//! value. The store provides atomic put/delete, prefix listing, and a
//! depth filter over listings; the label index layers per-entity label
//! maps and a selector evaluator on top of it.

pub mod label;
pub mod store;

pub use label::{LabelIndex, LabelRecord, SelectorError};
pub use store::{filter_by_depth, KvPair, Store, StoreError};
