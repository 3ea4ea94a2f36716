// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! API context shared across all request handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use mci_types::catalog::{CloudCatalog, K8sCatalog};

use crate::broker::BrokerClient;
use crate::config::ManagerConfig;
use crate::keyring::Keyring;
use crate::ratelimit::TokenBucket;
use crate::requests::RequestTracker;
use kvstore::{LabelIndex, Store};

/// Catalog assets baked into the binary.
const CLOUD_CATALOG_ASSET: &str = include_str!("../assets/cloud_catalog.yaml");
const K8S_CATALOG_ASSET: &str = include_str!("../assets/k8s_catalog.yaml");

/// Pace of connection probes against the broker, per second.
const PROBE_RATE: f64 = 10.0;

/// Shared state of the manager. One instance per process; handlers reach
/// it through the dropshot request context.
pub struct ApiContext {
    pub config: ManagerConfig,
    pub store: Store,
    pub labels: LabelIndex,
    pub broker: BrokerClient,
    /// Read-only after bootstrap
    pub catalog: CloudCatalog,
    /// Read-only after bootstrap
    pub k8s_catalog: K8sCatalog,
    pub keyring: Keyring,
    pub requests: Arc<RequestTracker>,
    pub probe_bucket: Arc<TokenBucket>,
    system_ready: AtomicBool,
}

impl ApiContext {
    /// Create the context: open the store, rebuild the label index, and
    /// load the baked-in catalogs.
    pub async fn new(config: ManagerConfig) -> Result<Self> {
        let store = Store::open(&config.store_dir)
            .await
            .context("Failed to open the store")?;
        let labels = LabelIndex::open(store.clone())
            .await
            .context("Failed to rebuild the label index")?;

        let catalog =
            CloudCatalog::from_yaml(CLOUD_CATALOG_ASSET).context("Invalid cloud catalog asset")?;
        let k8s_catalog =
            K8sCatalog::from_yaml(K8S_CATALOG_ASSET).context("Invalid k8s catalog asset")?;

        Ok(Self::assemble(config, store, labels, catalog, k8s_catalog))
    }

    /// Create a context over explicit parts (tests use this to supply
    /// their own catalog and store).
    pub fn with_parts(
        config: ManagerConfig,
        store: Store,
        labels: LabelIndex,
        catalog: CloudCatalog,
        k8s_catalog: K8sCatalog,
    ) -> Self {
        Self::assemble(config, store, labels, catalog, k8s_catalog)
    }

    fn assemble(
        config: ManagerConfig,
        store: Store,
        labels: LabelIndex,
        catalog: CloudCatalog,
        k8s_catalog: K8sCatalog,
    ) -> Self {
        let broker = BrokerClient::new(config.spider_rest_url.clone());
        let requests = Arc::new(RequestTracker::new(store.clone()));
        Self {
            config,
            store,
            labels,
            broker,
            catalog,
            k8s_catalog,
            keyring: Keyring::new(),
            requests,
            probe_bucket: Arc::new(TokenBucket::new(PROBE_RATE, PROBE_RATE)),
            system_ready: AtomicBool::new(false),
        }
    }

    /// Flip the readiness flag once all routes are installed.
    pub fn set_ready(&self) {
        self.system_ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.system_ready.load(Ordering::SeqCst)
    }
}
