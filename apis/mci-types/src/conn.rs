// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Connection registry types: connection configurations, credential
//! envelopes, and the public key handshake used to register credentials.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::RegionDetail;
use crate::common::KeyValue;

/// The region/zone a connection is pinned to, as resolved by the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RegionZoneInfo {
    pub assigned_region: String,
    pub assigned_zone: String,
}

/// A connection configuration: the (driver, credential, region-or-zone)
/// triple that identifies a usable broker endpoint.
///
/// Identity is `ConfigName`. At most one connection per (credential holder,
/// provider, region) carries `RegionRepresentative = true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ConnConfig {
    pub config_name: String,
    pub provider_name: String,
    pub driver_name: String,
    pub credential_name: String,
    #[serde(default)]
    pub credential_holder: String,
    pub region_zone_info_name: String,
    #[serde(default)]
    pub region_zone_info: RegionZoneInfo,
    #[serde(default)]
    pub region_detail: RegionDetail,
    /// Set when a reachability probe against this connection succeeded
    #[serde(default)]
    pub verified: bool,
    /// Set on the canonical per-(provider, region) connection
    #[serde(default)]
    pub region_representative: bool,
}

/// A list of connection configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConnConfigList {
    pub connectionconfig: Vec<ConnConfig>,
}

/// Response to a public key request: the PEM-encoded RSA public key and the
/// one-shot token identifying the matching private key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key_token_id: String,
    pub public_key: String,
}

/// An encrypted credential envelope.
///
/// The client encrypts an AES key under the issued RSA public key and each
/// credential value under that AES key (CBC, IV prepended, PKCS#7 padded,
/// base64 encoded). Credential values never travel or rest in the clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialReq {
    /// Owner of the credential; the sentinel default holder gets no prefix
    /// in generated names
    pub credential_holder: String,
    pub provider_name: String,
    /// Token from [`PublicKeyResponse`]; consumed on use
    pub public_key_token_id: String,
    /// AES key, RSA-OAEP encrypted under the issued public key, base64
    pub encrypted_client_aes_key_by_public_key: String,
    /// Credential fields; each value AES-CBC encrypted, base64
    pub credential_key_value_list: Vec<KeyValue>,
}

/// A registered credential, as acknowledged by the broker.
///
/// Values are redacted before this leaves the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialInfo {
    pub credential_name: String,
    #[serde(default)]
    pub credential_holder: String,
    pub provider_name: String,
    #[serde(default)]
    pub key_value_info_list: Vec<KeyValue>,
    /// Full connection list after fan-out registration and verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_connections: Option<ConnConfigList>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_config_wire_shape() {
        let cc = ConnConfig {
            config_name: "aws-us-east-1-a".into(),
            provider_name: "aws".into(),
            driver_name: "aws-driver".into(),
            credential_name: "aws".into(),
            region_zone_info_name: "aws-us-east-1-a".into(),
            verified: true,
            region_representative: false,
            ..Default::default()
        };
        let json = serde_json::to_value(&cc).unwrap();
        assert_eq!(json["ConfigName"], "aws-us-east-1-a");
        assert_eq!(json["Verified"], true);
        assert_eq!(json["RegionRepresentative"], false);
        assert!(json.get("config_name").is_none());
    }

    #[test]
    fn credential_req_is_camel_case() {
        let req = CredentialReq {
            credential_holder: "admin".into(),
            provider_name: "aws".into(),
            public_key_token_id: "tok".into(),
            encrypted_client_aes_key_by_public_key: "enc".into(),
            credential_key_value_list: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["publicKeyTokenId"], "tok");
        assert_eq!(json["credentialHolder"], "admin");
    }
}
