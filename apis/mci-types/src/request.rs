// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Request tracking types.
//!
//! Every inbound call gets a monotonic-unique request id; its metadata and
//! body dumps are persisted under `/request/<reqId>` with bounded
//! retention. Streaming handlers append progress entries under the same
//! id.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Terminal status of a tracked request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
)]
pub enum RequestStatus {
    /// The request is still being handled
    #[default]
    Handling,
    /// The request completed successfully
    Success,
    /// The request failed
    Error,
}

/// One intermediate progress entry of a long-running request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    /// RFC3339 timestamp
    pub time: String,
    pub message: String,
}

/// The persisted record of one tracked request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub req_id: String,
    pub method: String,
    pub path: String,
    pub status: RequestStatus,
    /// RFC3339 timestamps
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Dumped copy of the request body, when one was present
    #[serde(default)]
    pub request_body: Option<serde_json::Value>,
    /// Dumped copy of the response body
    #[serde(default)]
    pub response_body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<ProgressEntry>,
}

/// Listing of tracked requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestList {
    pub requests: Vec<RequestRecord>,
}
