// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Common types: namespaces, statuses, resource kinds, small envelopes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ============================================================================
// Small envelopes
// ============================================================================

/// A generic key/value pair, used for tag lists and broker metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Look up a value in a key/value list by key. Returns an empty string when
/// the key is absent.
pub fn lookup_key_value_list(list: &[KeyValue], key: &str) -> String {
    list.iter()
        .find(|kv| kv.key == key)
        .map(|kv| kv.value.clone())
        .unwrap_or_default()
}

/// A simple one-line message response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SimpleMsg {
    pub message: String,
}

impl SimpleMsg {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A bare list of identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IdList {
    #[serde(rename = "idList")]
    pub id_list: Vec<String>,
}

// ============================================================================
// Namespaces
// ============================================================================

/// Request body for creating or updating a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NsReq {
    /// Namespace name; becomes the namespace id
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// A namespace, the parent of every scoped resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NsInfo {
    pub id: String,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// RFC3339 creation timestamp
    #[serde(default)]
    pub created_at: String,
}

// ============================================================================
// Status machine
// ============================================================================

/// Lifecycle status shared by composite resources.
///
/// These spellings are read by external tooling and form a closed set.
/// The store transitions to the intent state before the broker call and to
/// the terminal state after a successful response; a failed broker call
/// leaves the matching `ErrorOn…` state.
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
    Display,
    EnumString,
)]
pub enum ResourceStatus {
    /// The resource is being configured
    Configuring,
    /// The resource information is being read
    Reading,
    /// The resource is being updated
    Updating,
    /// The resource is being deleted
    Deleting,
    /// The resource has been deleted
    Deleted,
    /// A pre-existing CSP resource is being adopted
    Registering,
    /// An adopted resource is being released
    Deregistering,
    /// Fully created and ready for use
    Available,
    /// Currently in use (e.g. a vNet that carries subnets)
    InUse,
    /// Status could not be determined
    #[default]
    Unknown,
    /// An unclassified error occurred
    Error,
    ErrorOnConfiguring,
    ErrorOnReading,
    ErrorOnUpdating,
    ErrorOnDeleting,
    ErrorOnRegistering,
    ErrorOnDeregistering,
}

// ============================================================================
// Resource kinds
// ============================================================================

/// The closed set of namespaced resource kinds.
///
/// The string form of each kind is the path segment under
/// `/ns/<ns>/resources/` and the label index partition for the kind.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ResourceKind {
    #[serde(rename = "vNet")]
    #[strum(serialize = "vNet")]
    VNet,
    #[serde(rename = "subnet")]
    #[strum(serialize = "subnet")]
    Subnet,
    #[serde(rename = "securityGroup")]
    #[strum(serialize = "securityGroup")]
    SecurityGroup,
    #[serde(rename = "sshKey")]
    #[strum(serialize = "sshKey")]
    SshKey,
    #[serde(rename = "image")]
    #[strum(serialize = "image")]
    Image,
    #[serde(rename = "customImage")]
    #[strum(serialize = "customImage")]
    CustomImage,
    #[serde(rename = "spec")]
    #[strum(serialize = "spec")]
    Spec,
    #[serde(rename = "dataDisk")]
    #[strum(serialize = "dataDisk")]
    DataDisk,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_spellings_are_stable() {
        assert_eq!(ResourceStatus::Configuring.to_string(), "Configuring");
        assert_eq!(ResourceStatus::InUse.to_string(), "InUse");
        assert_eq!(
            ResourceStatus::ErrorOnConfiguring.to_string(),
            "ErrorOnConfiguring"
        );
        assert_eq!(
            serde_json::to_string(&ResourceStatus::Deregistering).unwrap(),
            r#""Deregistering""#
        );
        assert_eq!(
            ResourceStatus::from_str("ErrorOnDeleting").unwrap(),
            ResourceStatus::ErrorOnDeleting
        );
    }

    #[test]
    fn kind_path_segments() {
        assert_eq!(ResourceKind::VNet.to_string(), "vNet");
        assert_eq!(ResourceKind::SecurityGroup.to_string(), "securityGroup");
        assert_eq!(ResourceKind::from_str("sshKey").unwrap(), ResourceKind::SshKey);
        assert!(ResourceKind::from_str("publicIp").is_err());
        assert_eq!(
            serde_json::to_string(&ResourceKind::CustomImage).unwrap(),
            r#""customImage""#
        );
    }

    #[test]
    fn key_value_wire_shape() {
        let kv = KeyValue::new("Region", "us-east-1");
        let json = serde_json::to_string(&kv).unwrap();
        assert_eq!(json, r#"{"Key":"Region","Value":"us-east-1"}"#);
    }

    #[test]
    fn lookup_key_value_list_finds_value() {
        let list = vec![
            KeyValue::new("Region", "us-east-1"),
            KeyValue::new("Zone", "us-east-1a"),
        ];
        assert_eq!(lookup_key_value_list(&list, "Zone"), "us-east-1a");
        assert_eq!(lookup_key_value_list(&list, "absent"), "");
    }
}
