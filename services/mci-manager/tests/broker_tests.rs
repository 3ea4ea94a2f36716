// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! End-to-end scenarios against a wiremock broker: credential fan-out
//! with representative election, vNet lifecycle with cascading delete,
//! MCI creation with bastion wiring and scale-out, and the status
//! fan-out deadline.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    create_ns, seed_connection, start_server, start_server_with, EchoAddSubnet, EchoBody,
    EchoGetVpc, EchoVm, EchoVpc, TestServer, TEST_CATALOG,
};

// ============================================================================
// Helpers
// ============================================================================

/// Encrypt a credential envelope the way a client would: AES key wrapped
/// with the issued RSA public key, each value AES-256-CBC encrypted with
/// the IV prepended.
fn encrypt_envelope(
    public_key_pem: &str,
    values: &[(&str, &str)],
) -> (String, Vec<serde_json::Value>) {
    use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
    use base64::Engine;
    use rand::RngCore;
    use rsa::pkcs1::DecodeRsaPublicKey;

    let b64 = base64::engine::general_purpose::STANDARD;
    let mut rng = rand::rngs::OsRng;
    let public_key = rsa::RsaPublicKey::from_pkcs1_pem(public_key_pem).unwrap();

    let mut aes_key = [0u8; 32];
    rng.fill_bytes(&mut aes_key);
    let wrapped = public_key
        .encrypt(&mut rng, rsa::Oaep::new::<sha2::Sha256>(), &aes_key)
        .unwrap();

    let encrypted_values = values
        .iter()
        .map(|(key, value)| {
            let mut iv = [0u8; 16];
            rng.fill_bytes(&mut iv);
            let ciphertext = cbc::Encryptor::<aes::Aes256>::new_from_slices(&aes_key, &iv)
                .unwrap()
                .encrypt_padded_vec_mut::<Pkcs7>(value.as_bytes());
            let mut enc = iv.to_vec();
            enc.extend_from_slice(&ciphertext);
            serde_json::json!({"Key": key, "Value": b64.encode(&enc)})
        })
        .collect();

    (b64.encode(&wrapped), encrypted_values)
}

async fn issue_public_key(server: &TestServer) -> (String, String) {
    let resp: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/credential/publicKey"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    (
        resp["publicKeyTokenId"].as_str().unwrap().to_string(),
        resp["publicKey"].as_str().unwrap().to_string(),
    )
}

fn region_zone_body(region_name: &str, region: &str, zone: &str) -> serde_json::Value {
    serde_json::json!({
        "ProviderName": "AWS",
        "RegionName": region_name,
        "KeyValueInfoList": [
            {"Key": "Region", "Value": region},
            {"Key": "Zone", "Value": zone},
        ],
    })
}

/// Stand up an MCI named `m1` with one subgroup `app` of `size` VMs,
/// including the spec/image fetch that feeds it.
async fn provision_mci(server: &TestServer, broker: &MockServer, size: u32) {
    Mock::given(method("GET"))
        .and(path("/vmspec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"Name": "t3.large", "VCpu": {"Count": "2"}, "Mem": "8192"}
        ])))
        .mount(broker)
        .await;
    Mock::given(method("GET"))
        .and(path("/vmimage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"IId": {"NameId": "ami-ubuntu-22", "SystemId": "ami-123"}, "GuestOS": "ubuntu"}
        ])))
        .mount(broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/vpc"))
        .respond_with(EchoVpc)
        .mount(broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/securitygroup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": "sg-name", "SystemId": "sg-123"}
        })))
        .mount(broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/keypair"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": "key-name", "SystemId": "key-123"},
            "Fingerprint": "fp", "PublicKey": "pk", "PrivateKey": "sk"
        })))
        .mount(broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/vm"))
        .respond_with(EchoVm)
        .mount(broker)
        .await;

    create_ns(server, "default").await;
    seed_connection(
        &server.store,
        "aws-us-east-1",
        "us-east-1",
        &["us-east-1a", "us-east-1b"],
    )
    .await;

    for endpoint in ["fetchSpecs", "fetchImages"] {
        let resp = server
            .client
            .post(server.url(&format!("/tumblebug/ns/default/resources/{endpoint}")))
            .json(&serde_json::json!({"connectionName": "aws-us-east-1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{endpoint} failed");
    }

    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/mciDynamic"))
        .json(&serde_json::json!({
            "name": "m1",
            "vm": [{
                "name": "app",
                "specId": "aws-us-east-1-t3-large",
                "imageId": "aws-us-east-1-ami-ubuntu-22",
                "subGroupSize": size,
            }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let mci: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(mci["Status"], "Running");
    assert_eq!(mci["VmList"].as_array().unwrap().len(), size as usize);
}

// ============================================================================
// S1 — credential verification fan-out
// ============================================================================

#[tokio::test]
async fn credential_fanout_elects_representatives() {
    let broker = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/credential"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "CredentialName": "aws",
            "ProviderName": "AWS",
            "KeyValueInfoList": [{"Key": "ClientId", "Value": "plain-client-id"}],
        })))
        .mount(&broker)
        .await;

    let region_names = [
        ("aws-us-east-1", "us-east-1", "a"),
        ("aws-us-east-1-a", "us-east-1", "a"),
        ("aws-us-east-1-b", "us-east-1", "b"),
        ("aws-us-west-2", "us-west-2", "a"),
        ("aws-us-west-2-a", "us-west-2", "a"),
        ("aws-us-west-2-b", "us-west-2", "b"),
    ];
    let listing: Vec<serde_json::Value> = region_names
        .iter()
        .map(|(name, _, _)| serde_json::json!({"ProviderName": "AWS", "RegionName": name}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/region"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"region": listing})),
        )
        .mount(&broker)
        .await;
    for (name, region, zone) in region_names {
        Mock::given(method("GET"))
            .and(path(format!("/region/{name}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(region_zone_body(name, region, zone)),
            )
            .mount(&broker)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/connectionconfig"))
        .respond_with(EchoBody)
        .mount(&broker)
        .await;
    Mock::given(method("GET"))
        .and(path("/allkeypair"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&broker)
        .await;

    let server = start_server(&broker.uri()).await;
    let (token, public_key) = issue_public_key(&server).await;
    let (wrapped_key, values) = encrypt_envelope(
        &public_key,
        &[("ClientId", "plain-client-id"), ("ClientSecret", "s3cr3t")],
    );

    let resp = server
        .client
        .post(server.url("/tumblebug/credential"))
        .json(&serde_json::json!({
            "credentialHolder": "admin",
            "providerName": "aws",
            "publicKeyTokenId": token,
            "encryptedClientAesKeyByPublicKey": wrapped_key,
            "credentialKeyValueList": values,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let credential: serde_json::Value = resp.json().await.unwrap();

    // only the redacted form leaves the service
    assert_eq!(credential["KeyValueInfoList"][0]["Value"], "************");

    let connections = credential["AllConnections"]["connectionconfig"]
        .as_array()
        .unwrap();
    assert_eq!(connections.len(), 6);
    let mut names: Vec<&str> = connections
        .iter()
        .map(|c| c["ConfigName"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "aws-us-east-1",
            "aws-us-east-1-a",
            "aws-us-east-1-b",
            "aws-us-west-2",
            "aws-us-west-2-a",
            "aws-us-west-2-b",
        ]
    );

    // exactly one representative per (provider, region) pair; which
    // connection of the group won depends on probe completion order, but
    // every probe succeeded here so the winner must be verified
    let representatives: Vec<&serde_json::Value> = connections
        .iter()
        .filter(|c| c["RegionRepresentative"] == true)
        .collect();
    assert_eq!(representatives.len(), 2);
    for region in ["us-east-1", "us-west-2"] {
        let in_region: Vec<&&serde_json::Value> = representatives
            .iter()
            .filter(|c| c["RegionDetail"]["RegionId"] == region)
            .collect();
        assert_eq!(in_region.len(), 1, "one representative for {region}");
        assert_eq!(in_region[0]["Verified"], true);
    }
    assert!(connections.iter().all(|c| c["Verified"] == true));
}

// ============================================================================
// Property 3 — the key token is one-shot
// ============================================================================

#[tokio::test]
async fn credential_token_is_consumed_on_failure() {
    let broker = MockServer::start().await;
    let server = start_server(&broker.uri()).await;
    let (token, _public_key) = issue_public_key(&server).await;

    let envelope = serde_json::json!({
        "credentialHolder": "admin",
        "providerName": "aws",
        "publicKeyTokenId": token,
        "encryptedClientAesKeyByPublicKey": "bm90LWEtcmVhbC1rZXk=",
        "credentialKeyValueList": [],
    });

    // decryption fails, and the token dies with the attempt
    let resp = server
        .client
        .post(server.url("/tumblebug/credential"))
        .json(&envelope)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .client
        .post(server.url("/tumblebug/credential"))
        .json(&envelope)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.unwrap();
    assert!(body.contains("not found"), "token must be gone: {body}");
}

// ============================================================================
// S2 / S5 — vNet lifecycle
// ============================================================================

#[tokio::test]
async fn vnet_create_read_and_cascading_delete() {
    let broker = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vpc"))
        .respond_with(EchoVpc)
        .mount(&broker)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/vpc/[^/]+/subnet$"))
        .respond_with(EchoAddSubnet)
        .mount(&broker)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/vpc/[^/]+$"))
        .respond_with(EchoGetVpc)
        .mount(&broker)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/vpc/[^/]+/subnet/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Result": "true"})))
        .mount(&broker)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/vpc/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Result": "true"})))
        .mount(&broker)
        .await;

    let server = start_server(&broker.uri()).await;
    create_ns(&server, "default").await;
    seed_connection(
        &server.store,
        "aws-us-east-1",
        "us-east-1",
        &["us-east-1a", "us-east-1b"],
    )
    .await;

    // rejected: zero subnets
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/resources/vNet"))
        .json(&serde_json::json!({
            "Name": "empty", "ConnectionName": "aws-us-east-1",
            "CidrBlock": "10.0.0.0/16", "SubnetInfoList": [],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // rejected: subnet outside the vNet CIDR
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/resources/vNet"))
        .json(&serde_json::json!({
            "Name": "outside", "ConnectionName": "aws-us-east-1",
            "CidrBlock": "10.0.0.0/16",
            "SubnetInfoList": [{"Name": "sn1", "IPv4_CIDR": "192.168.1.0/24"}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // rejected: zone the region does not declare
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/resources/vNet"))
        .json(&serde_json::json!({
            "Name": "badzone", "ConnectionName": "aws-us-east-1",
            "CidrBlock": "10.0.0.0/16",
            "SubnetInfoList": [{"Name": "sn1", "IPv4_CIDR": "10.0.1.0/24", "Zone": "us-west-2a"}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // S2: the canonical create
    let create_body = serde_json::json!({
        "Name": "vnet1",
        "ConnectionName": "aws-us-east-1",
        "CidrBlock": "10.0.0.0/16",
        "SubnetInfoList": [{"Name": "sn1", "IPv4_CIDR": "10.0.1.0/24", "Zone": "us-east-1a"}],
    });
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/resources/vNet"))
        .json(&create_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let vnet: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(vnet["Id"], "vnet1");
    assert_eq!(vnet["Name"], "vnet1");
    assert_eq!(vnet["ConnectionName"], "aws-us-east-1");
    assert_eq!(vnet["CidrBlock"], "10.0.0.0/16");
    assert_eq!(vnet["Status"], "InUse");
    assert!(!vnet["Uuid"].as_str().unwrap().is_empty());
    assert_eq!(vnet["CspVNetId"], "vpc-1234");
    let subnet = &vnet["SubnetInfoList"][0];
    assert_eq!(subnet["Id"], "sn1");
    assert_eq!(subnet["Zone"], "us-east-1a");
    assert_eq!(subnet["Status"], "Available");
    assert!(!subnet["CspSubnetId"].as_str().unwrap().is_empty());
    assert_eq!(subnet["CspVNetId"], vnet["CspVNetId"]);

    // round trip: the read returns the submitted object plus the
    // assigned identifiers
    let resp = server
        .client
        .get(server.url("/tumblebug/ns/default/resources/vNet/vnet1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let read: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(read, vnet);

    // both keys are in the store
    for key in [
        "/ns/default/resources/vNet/vnet1",
        "/ns/default/resources/vNet/vnet1/subnet/sn1",
    ] {
        let resp = server
            .client
            .get(server.url("/tumblebug/object"))
            .query(&[("key", key)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "missing key {key}");
    }

    // idempotence: the same create is a conflict and changes nothing
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/resources/vNet"))
        .json(&create_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // a second subnet, then the cascade checks
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/resources/vNet/vnet1/subnet"))
        .json(&serde_json::json!({"Name": "sn2", "IPv4_CIDR": "10.0.2.0/24"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // without the cascade flag: conflict, subnets untouched
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default/resources/vNet/vnet1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let resp = server
        .client
        .get(server.url("/tumblebug/object"))
        .query(&[("key", "/ns/default/resources/vNet/vnet1/subnet/sn1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // S5: cascading delete removes the whole subtree
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default/resources/vNet/vnet1"))
        .query(&[("withSubnets", "true")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let msg: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(msg["message"], "the vNet (vnet1) has been deleted");

    let resp = server
        .client
        .get(server.url("/tumblebug/objects"))
        .query(&[("key", "/ns/default/resources/vNet/vnet1")])
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = resp.json().await.unwrap();
    assert!(listing["idList"].as_array().unwrap().is_empty());

    // deleting again is NotFound, state unchanged
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default/resources/vNet/vnet1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// S6 — bastion wiring, plus scale-out
// ============================================================================

#[tokio::test]
async fn mci_bastion_and_scale_out() {
    let broker = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/vm/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Result": "true"})))
        .mount(&broker)
        .await;

    let server = start_server(&broker.uri()).await;
    provision_mci(&server, &broker, 3).await;

    // S6: set and read a bastion reference
    let resp = server
        .client
        .put(server.url("/tumblebug/ns/default/mci/m1/vm/app-1/bastion/app-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bastion: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/ns/default/mci/m1/vm/app-1/bastion"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bastion["bastionVmId"], "app-2");

    // cycles and self-references are rejected
    let resp = server
        .client
        .put(server.url("/tumblebug/ns/default/mci/m1/vm/app-2/bastion/app-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = server
        .client
        .put(server.url("/tumblebug/ns/default/mci/m1/vm/app-1/bastion/app-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // a bastion with dependents refuses deletion without force
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default/mci/m1/vm/app-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // clearing the references opens the way
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default/mci/m1/bastion/app-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bastion: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/ns/default/mci/m1/vm/app-1/bastion"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bastion["bastionVmId"], "");

    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default/mci/m1/vm/app-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // scale-out continues the subgroup numbering past the high-water mark
    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/mci/m1/subgroup/app"))
        .json(&serde_json::json!({"numberOfAddedVm": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let mci: serde_json::Value = resp.json().await.unwrap();
    let vm_ids: Vec<&str> = mci["VmList"]
        .as_array()
        .unwrap()
        .iter()
        .map(|vm| vm["Id"].as_str().unwrap())
        .collect();
    assert_eq!(vm_ids, vec!["app-1", "app-3", "app-4", "app-5"]);

    let subgroup: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/ns/default/mci/m1/subgroup/app"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        subgroup["VmIdList"],
        serde_json::json!(["app-1", "app-3", "app-4", "app-5"])
    );
}

// ============================================================================
// S3 — status fan-out under a deadline
// ============================================================================

/// Answers the first two status probes immediately and stalls the third
/// past the test deadline.
struct SlowThirdStatus {
    calls: AtomicUsize,
}

impl wiremock::Respond for SlowThirdStatus {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let template = ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"Status": "Running"}));
        if n < 2 {
            template
        } else {
            template.set_delay(Duration::from_secs(8))
        }
    }
}

#[tokio::test]
async fn mci_status_fanout_times_out_with_partial_state() {
    let broker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/vmstatus/[^/]+$"))
        .respond_with(SlowThirdStatus {
            calls: AtomicUsize::new(0),
        })
        .mount(&broker)
        .await;

    let server =
        start_server_with(&broker.uri(), TEST_CATALOG, Duration::from_secs(2)).await;
    provision_mci(&server, &broker, 3).await;

    let resp = server
        .client
        .get(server.url("/tumblebug/ns/default/mci/m1"))
        .query(&[("option", "status")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

    let body = resp.text().await.unwrap();
    // two fresh statuses, the straggler reads Unknown
    assert!(body.contains("Running"), "partial state missing: {body}");
    assert!(body.contains("Unknown"), "straggler not marked: {body}");
}

// ============================================================================
// Snapshot → customImage + dataDisks
// ============================================================================

#[tokio::test]
async fn vm_snapshot_creates_custom_image_and_disks() {
    let broker = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/myimage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": "myimage-name", "SystemId": "img-987"},
            "SourceVM": "whatever",
            "Status": "Available",
            "DataDiskIIdList": [
                {"NameId": "disk-a", "SystemId": "vol-1"},
                {"NameId": "disk-b", "SystemId": "vol-2"},
            ],
        })))
        .mount(&broker)
        .await;

    let server = start_server(&broker.uri()).await;
    provision_mci(&server, &broker, 1).await;

    let resp = server
        .client
        .post(server.url("/tumblebug/ns/default/mci/m1/vm/app-1/snapshot"))
        .json(&serde_json::json!({"name": "golden"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let result: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(result["customImage"]["id"], "golden");
    assert_eq!(result["customImage"]["sourceVmId"], "app-1");
    assert_eq!(result["customImage"]["cspCustomImageId"], "img-987");
    let disks = result["dataDisks"].as_array().unwrap();
    assert_eq!(disks.len(), 2);
    assert_eq!(disks[0]["Id"], "golden-disk-1");
    assert_eq!(disks[1]["CspDataDiskId"], "vol-2");

    // both live under the namespace's resources afterwards
    let image: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/ns/default/resources/customImage/golden"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(image["sourceVmSpecId"], "aws-us-east-1-t3-large");
    let disk: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/ns/default/resources/dataDisk/golden-disk-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(disk["Status"], "Available");
}
