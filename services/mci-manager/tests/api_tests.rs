// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! HTTP API tests that need no broker: namespaces, naming rules, labels
//! and selection, request tracking, and the raw object browser.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{create_ns, start_server};
use reqwest::StatusCode;

// The broker is never called in these tests; point at a closed port.
const NO_BROKER: &str = "http://127.0.0.1:1";

#[tokio::test]
async fn namespace_crud_and_emptiness_guard() {
    let server = start_server(NO_BROKER).await;

    // create
    let resp = server
        .client
        .post(server.url("/tumblebug/ns"))
        .json(&serde_json::json!({ "name": "default", "description": "first" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ns: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(ns["id"], "default");
    assert!(!ns["uuid"].as_str().unwrap().is_empty());

    // duplicate is a conflict, state unchanged
    let resp = server
        .client
        .post(server.url("/tumblebug/ns"))
        .json(&serde_json::json!({ "name": "default" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // read it back
    let resp = server
        .client
        .get(server.url("/tumblebug/ns/default"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let read: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(read["description"], "first");

    // list
    let resp = server
        .client
        .get(server.url("/tumblebug/ns"))
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(list["idList"], serde_json::json!(["default"]));

    // checkNs
    let resp = server
        .client
        .get(server.url("/tumblebug/checkNs/default"))
        .send()
        .await
        .unwrap();
    let check: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(check["exists"], true);

    // a namespace that owns an object refuses deletion
    server
        .store
        .put("/ns/default/resources/sshKey/k1", "{}")
        .await
        .unwrap();
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    server
        .store
        .delete("/ns/default/resources/sshKey/k1")
        .await
        .unwrap();
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // deleting a missing namespace is 404, state unchanged
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/default"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn name_rule_boundary_cases_over_http() {
    let server = start_server(NO_BROKER).await;

    for (name, accepted) in [
        ("a", true),
        ("a--b", true),
        ("1a", false),
        ("a-", false),
        ("", false),
    ] {
        let resp = server
            .client
            .post(server.url("/tumblebug/ns"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .unwrap();
        if accepted {
            assert_eq!(resp.status(), StatusCode::OK, "name {name:?} must pass");
        } else {
            assert_eq!(
                resp.status(),
                StatusCode::BAD_REQUEST,
                "name {name:?} must be rejected"
            );
        }
    }
}

#[tokio::test]
async fn label_selectors() {
    let server = start_server(NO_BROKER).await;

    // three namespaces with distinct label sets
    for name in ["e1", "e2", "e3"] {
        create_ns(&server, name).await;
    }
    let mut uuids = std::collections::HashMap::new();
    for name in ["e1", "e2", "e3"] {
        let ns: serde_json::Value = server
            .client
            .get(server.url(&format!("/tumblebug/ns/{name}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        uuids.insert(name, ns["uuid"].as_str().unwrap().to_string());
    }

    let labels = [
        ("e1", serde_json::json!({"env": "prod", "tier": "api"})),
        ("e2", serde_json::json!({"env": "prod", "tier": "db"})),
        ("e3", serde_json::json!({"env": "dev"})),
    ];
    for (name, label_map) in &labels {
        let resp = server
            .client
            .put(server.url(&format!("/tumblebug/label/ns/{}", uuids[name])))
            .json(label_map)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // put → get round trip
    let got: serde_json::Value = server
        .client
        .get(server.url(&format!("/tumblebug/label/ns/{}", uuids["e1"])))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(got, labels[0].1);

    let select = |selector: &str| {
        let url = server.url("/tumblebug/resources/ns");
        let client = server.client.clone();
        let selector = selector.to_string();
        async move {
            let resp = client
                .get(url)
                .query(&[("labelSelector", selector)])
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body: serde_json::Value = resp.json().await.unwrap();
            let mut ids: Vec<String> = body["results"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v["id"].as_str().unwrap().to_string())
                .collect();
            ids.sort();
            ids
        }
    };

    assert_eq!(select("env=prod,tier in (api,db)").await, vec!["e1", "e2"]);
    assert!(select("env!=prod,tier exists").await.is_empty());
    assert_eq!(select("!tier").await, vec!["e3"]);

    // unknown operators are parse errors
    let resp = server
        .client
        .get(server.url("/tumblebug/resources/ns"))
        .query(&[("labelSelector", "env>prod")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // removing a single key
    let resp = server
        .client
        .delete(server.url(&format!("/tumblebug/label/ns/{}/tier", uuids["e1"])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(select("tier exists").await, vec!["e2"]);
}

#[tokio::test]
async fn request_tracking_records_bodies() {
    let server = start_server(NO_BROKER).await;
    create_ns(&server, "tracked").await;

    let list: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/requests"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let requests = list["requests"].as_array().unwrap();
    assert!(!requests.is_empty());

    let record = requests
        .iter()
        .find(|r| r["path"] == "/tumblebug/ns" && r["method"] == "POST")
        .expect("namespace creation must be tracked");
    assert_eq!(record["status"], "Success");
    assert_eq!(record["requestBody"]["name"], "tracked");
    assert_eq!(record["responseBody"]["id"], "tracked");

    let req_id = record["reqId"].as_str().unwrap();
    let single: serde_json::Value = server
        .client
        .get(server.url(&format!("/tumblebug/request/{req_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(single["reqId"], req_id);

    // failed operations carry the error
    let resp = server
        .client
        .delete(server.url("/tumblebug/ns/absent"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let list: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/requests"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list["requests"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["status"] == "Error" && r["path"] == "/tumblebug/ns/absent"));

    // delete all
    let resp = server
        .client
        .delete(server.url("/tumblebug/requests"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/requests"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list["requests"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn object_browser_round_trip() {
    let server = start_server(NO_BROKER).await;
    create_ns(&server, "browse").await;

    let obj: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/object"))
        .query(&[("key", "/ns/browse")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(obj["id"], "browse");

    let list: serde_json::Value = server
        .client
        .get(server.url("/tumblebug/objects"))
        .query(&[("key", "/ns/browse")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["idList"], serde_json::json!(["/ns/browse"]));

    let resp = server
        .client
        .get(server.url("/tumblebug/object"))
        .query(&[("key", "/ns/missing")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn readyz_reports_ready() {
    let server = start_server(NO_BROKER).await;
    let resp = server
        .client
        .get(server.url("/tumblebug/readyz"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
