// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Shared test harness: an in-process manager wired to a disposable store
//! and an arbitrary (usually wiremock) broker endpoint.

#![allow(dead_code)]

use std::time::Duration;

use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};

use mci_manager::config::{AuthConfig, ManagerConfig};
use mci_manager::context::ApiContext;
use mci_manager::keys;
use mci_types::catalog::{CloudCatalog, K8sCatalog};
use mci_types::conn::ConnConfig;
use kvstore::{LabelIndex, Store};

/// Test catalog: aws with two regions of two zones each.
pub const TEST_CATALOG: &str = r#"
csps:
  aws:
    driver: aws-driver-v1.0.so
    regions:
      us-east-1:
        RegionId: us-east-1
        Zones: [a, b]
      us-west-2:
        RegionId: us-west-2
        Zones: [a, b]
"#;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Store,
    _server: dropshot::HttpServer<ApiContext>,
    _store_dir: tempfile::TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start a manager wired to `broker_url`, with the default test catalog.
pub async fn start_server(broker_url: &str) -> TestServer {
    start_server_with(broker_url, TEST_CATALOG, Duration::from_secs(60)).await
}

/// Start a manager with an explicit catalog and MCI status deadline.
pub async fn start_server_with(
    broker_url: &str,
    catalog_yaml: &str,
    mci_status_deadline: Duration,
) -> TestServer {
    let store_dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(store_dir.path()).await.expect("open store");
    let labels = LabelIndex::open(store.clone()).await.expect("label index");
    let catalog = CloudCatalog::from_yaml(catalog_yaml).expect("test catalog");

    let config = ManagerConfig {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        spider_rest_url: broker_url.to_string(),
        store_dir: store_dir.path().to_path_buf(),
        allow_origins: "*".to_string(),
        auth: AuthConfig::Disabled,
        self_endpoint: String::new(),
        mci_status_deadline,
    };

    let ctx = ApiContext::with_parts(
        config.clone(),
        store.clone(),
        labels,
        catalog,
        K8sCatalog::default(),
    );
    ctx.set_ready();

    let api = mci_manager::api_description().expect("api description");
    let config_dropshot = ConfigDropshot {
        bind_address: config.bind_address,
        default_request_body_max_bytes: 10 * 1024 * 1024,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };
    let log = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Error,
    }
    .to_logger("mci-manager-test")
    .expect("logger");

    let server = HttpServerStarter::new(&config_dropshot, api, ctx, &log)
        .expect("server")
        .start();
    let base_url = format!("http://{}", server.local_addr());

    TestServer {
        base_url,
        client: reqwest::Client::new(),
        store,
        _server: server,
        _store_dir: store_dir,
    }
}

/// Seed a verified connection directly into the store, bypassing the
/// credential flow.
pub async fn seed_connection(store: &Store, config_name: &str, region_id: &str, zones: &[&str]) {
    let conn = ConnConfig {
        config_name: config_name.to_string(),
        provider_name: "aws".into(),
        driver_name: "aws-driver-v1.0.so".into(),
        credential_name: "aws".into(),
        credential_holder: "admin".into(),
        region_zone_info_name: config_name.to_string(),
        region_detail: mci_types::catalog::RegionDetail {
            region_id: region_id.to_string(),
            region_name: region_id.to_string(),
            zones: zones.iter().map(|z| z.to_string()).collect(),
            ..Default::default()
        },
        verified: true,
        region_representative: true,
        ..Default::default()
    };
    store
        .put(
            &keys::connection_key(config_name),
            &serde_json::to_string(&conn).unwrap(),
        )
        .await
        .unwrap();
}

/// Broker stub: answer a VPC create/register with identifiers derived
/// from the request, echoing each subnet's requested name as its NameId.
pub struct EchoVpc;

impl wiremock::Respond for EchoVpc {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let req_info = &body["ReqInfo"];
        let subnets: Vec<serde_json::Value> = req_info["SubnetInfoList"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                serde_json::json!({
                    "IId": {"NameId": s["Name"], "SystemId": format!("subnet-{}", i + 1)},
                    "IPv4_CIDR": s["IPv4_CIDR"],
                    "Zone": s["Zone"],
                })
            })
            .collect();
        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": req_info["Name"], "SystemId": "vpc-1234"},
            "IPv4_CIDR": req_info["IPv4_CIDR"],
            "SubnetInfoList": subnets,
        }))
    }
}

/// Broker stub: answer a subnet addition with the whole VPC, the new
/// subnet's requested name echoed as its NameId.
pub struct EchoAddSubnet;

impl wiremock::Respond for EchoAddSubnet {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let req_info = &body["ReqInfo"];
        let vpc_name = request
            .url
            .path()
            .trim_start_matches("/vpc/")
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": vpc_name, "SystemId": "vpc-1234"},
            "SubnetInfoList": [{
                "IId": {"NameId": req_info["Name"], "SystemId": "subnet-9"},
                "IPv4_CIDR": req_info["IPv4_CIDR"],
                "Zone": req_info["Zone"],
            }],
        }))
    }
}

/// Broker stub: answer a VM create with identifiers derived from the
/// requested name.
pub struct EchoVm;

impl wiremock::Respond for EchoVm {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let name = body["ReqInfo"]["Name"].as_str().unwrap_or_default();
        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": name, "SystemId": format!("i-{}", &name[..8.min(name.len())])},
            "PublicIP": "54.0.0.1",
            "PrivateIP": "10.0.1.10",
            "VMSpecName": body["ReqInfo"]["VMSpecName"],
        }))
    }
}

/// Broker stub: answer a VPC read with identifiers derived from the path.
pub struct EchoGetVpc;

impl wiremock::Respond for EchoGetVpc {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let vpc_name = request
            .url
            .path()
            .trim_start_matches("/vpc/")
            .to_string();
        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "IId": {"NameId": vpc_name, "SystemId": "vpc-1234"},
            "IPv4_CIDR": "10.0.0.0/16",
            "SubnetInfoList": [],
        }))
    }
}

/// Broker stub: echo the request body back verbatim.
pub struct EchoBody;

impl wiremock::Respond for EchoBody {
    fn respond(&self, request: &wiremock::Request) -> wiremock::ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        wiremock::ResponseTemplate::new(200).set_body_json(body)
    }
}

/// Create a namespace through the API and panic on failure.
pub async fn create_ns(server: &TestServer, name: &str) {
    let resp = server
        .client
        .post(server.url("/tumblebug/ns"))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .expect("post ns");
    assert!(
        resp.status().is_success(),
        "namespace creation failed: {}",
        resp.text().await.unwrap_or_default()
    );
}
