// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Request tracking and path budgets.
//!
//! Every inbound call gets a monotonic-unique id. The request record
//! (metadata plus request/response body dumps) is persisted under
//! `/request/<reqId>` with ring retention; streaming handlers append
//! progress entries under the same id. The tracker also owns the rate
//! policy: a global budget for the whole surface and a tighter one for
//! the read-heavy MCI paths.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use mci_types::request::{ProgressEntry, RequestList, RequestRecord, RequestStatus};

use crate::error::ApiError;
use crate::keys;
use crate::ratelimit::TokenBucket;
use kvstore::Store;

/// Ring retention: oldest records are evicted past this count.
pub const RETENTION: usize = 10_000;

/// Global surface budget, requests per second.
const GLOBAL_RATE: f64 = 20.0;
/// Budget for the read-heavy MCI paths.
const MCI_READ_RATE: f64 = 2.0;
/// How long a request may wait for a token before 429.
const BUDGET_WAIT: Duration = Duration::from_millis(1500);

/// The request tracker.
pub struct RequestTracker {
    store: Store,
    order: Mutex<VecDeque<String>>,
    seq: AtomicU64,
    global_budget: Arc<TokenBucket>,
    mci_read_budget: Arc<TokenBucket>,
}

impl RequestTracker {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            order: Mutex::new(VecDeque::new()),
            seq: AtomicU64::new(0),
            global_budget: Arc::new(TokenBucket::new(GLOBAL_RATE, GLOBAL_RATE * 2.0)),
            mci_read_budget: Arc::new(TokenBucket::new(MCI_READ_RATE, MCI_READ_RATE)),
        }
    }

    /// Next monotonic-unique request id.
    fn next_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:06}", Utc::now().timestamp_millis(), seq)
    }

    /// Open a record for an inbound call, charging the global budget.
    pub async fn begin(
        &self,
        method: &str,
        path: &str,
        request_body: Option<serde_json::Value>,
    ) -> Result<String, ApiError> {
        if !self.global_budget.acquire_within(BUDGET_WAIT).await {
            return Err(ApiError::RateLimited(
                "request budget exhausted, try again later".into(),
            ));
        }
        self.open_record(method, path, request_body).await
    }

    /// Like [`begin`], but also charges the MCI read-path budget.
    ///
    /// [`begin`]: RequestTracker::begin
    pub async fn begin_mci_read(
        &self,
        method: &str,
        path: &str,
    ) -> Result<String, ApiError> {
        if !self.global_budget.acquire_within(BUDGET_WAIT).await {
            return Err(ApiError::RateLimited(
                "request budget exhausted, try again later".into(),
            ));
        }
        if !self.mci_read_budget.acquire_within(BUDGET_WAIT).await {
            return Err(ApiError::RateLimited(
                "MCI read budget exhausted, try again later".into(),
            ));
        }
        self.open_record(method, path, None).await
    }

    async fn open_record(
        &self,
        method: &str,
        path: &str,
        request_body: Option<serde_json::Value>,
    ) -> Result<String, ApiError> {
        let req_id = self.next_id();
        let record = RequestRecord {
            req_id: req_id.clone(),
            method: method.to_string(),
            path: path.to_string(),
            status: RequestStatus::Handling,
            start_time: Utc::now().to_rfc3339(),
            request_body,
            ..Default::default()
        };
        self.persist(&record).await?;

        let mut order = self.order.lock().await;
        order.push_back(req_id.clone());
        while order.len() > RETENTION {
            if let Some(evicted) = order.pop_front() {
                self.store.delete(&keys::request_key(&evicted)).await?;
            }
        }
        Ok(req_id)
    }

    /// Close a record with its outcome and a dump of the response body.
    pub async fn finish(
        &self,
        req_id: &str,
        outcome: Result<serde_json::Value, String>,
    ) -> Result<(), ApiError> {
        let Some(mut record) = self.load(req_id).await? else {
            return Ok(());
        };
        record.end_time = Utc::now().to_rfc3339();
        match outcome {
            Ok(body) => {
                record.status = RequestStatus::Success;
                record.response_body = Some(body);
            }
            Err(message) => {
                record.status = RequestStatus::Error;
                record.error_message = message;
            }
        }
        self.persist(&record).await
    }

    /// Append a progress entry to a streaming request.
    pub async fn progress(&self, req_id: &str, message: &str) -> Result<(), ApiError> {
        let Some(mut record) = self.load(req_id).await? else {
            return Ok(());
        };
        record.progress.push(ProgressEntry {
            time: Utc::now().to_rfc3339(),
            message: message.to_string(),
        });
        self.persist(&record).await
    }

    pub async fn get(&self, req_id: &str) -> Result<RequestRecord, ApiError> {
        self.load(req_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("request not found: {req_id}")))
    }

    /// List records, newest first.
    pub async fn list(&self) -> Result<RequestList, ApiError> {
        let mut requests = Vec::new();
        for entry in self.store.list("/request/").await {
            requests.push(serde_json::from_str::<RequestRecord>(&entry.value)?);
        }
        requests.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(RequestList { requests })
    }

    pub async fn delete(&self, req_id: &str) -> Result<(), ApiError> {
        if self.load(req_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("request not found: {req_id}")));
        }
        self.store.delete(&keys::request_key(req_id)).await?;
        self.order.lock().await.retain(|id| id != req_id);
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<usize, ApiError> {
        let removed = self.store.delete_prefix("/request/").await?;
        self.order.lock().await.clear();
        Ok(removed)
    }

    async fn load(&self, req_id: &str) -> Result<Option<RequestRecord>, ApiError> {
        match self.store.get(&keys::request_key(req_id)).await {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn persist(&self, record: &RequestRecord) -> Result<(), ApiError> {
        self.store
            .put(
                &keys::request_key(&record.req_id),
                &serde_json::to_string(record)?,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_and_dump() {
        let tracker = RequestTracker::new(Store::in_memory());
        let id = tracker
            .begin("POST", "/tumblebug/ns", Some(serde_json::json!({"name": "default"})))
            .await
            .unwrap();

        let record = tracker.get(&id).await.unwrap();
        assert_eq!(record.status, RequestStatus::Handling);
        assert_eq!(record.method, "POST");
        assert_eq!(record.request_body.unwrap()["name"], "default");

        tracker
            .finish(&id, Ok(serde_json::json!({"id": "default"})))
            .await
            .unwrap();
        let record = tracker.get(&id).await.unwrap();
        assert_eq!(record.status, RequestStatus::Success);
        assert_eq!(record.response_body.unwrap()["id"], "default");
        assert!(!record.end_time.is_empty());
    }

    #[tokio::test]
    async fn ids_are_unique_and_monotonic() {
        let tracker = RequestTracker::new(Store::in_memory());
        let a = tracker.begin("GET", "/x", None).await.unwrap();
        let b = tracker.begin("GET", "/x", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn progress_entries_accumulate() {
        let tracker = RequestTracker::new(Store::in_memory());
        let id = tracker.begin("POST", "/vpn", None).await.unwrap();
        tracker.progress(&id, "initiating").await.unwrap();
        tracker.progress(&id, "broker acknowledged").await.unwrap();
        let record = tracker.get(&id).await.unwrap();
        assert_eq!(record.progress.len(), 2);
        assert_eq!(record.progress[1].message, "broker acknowledged");
    }

    #[tokio::test]
    async fn error_outcome_is_recorded() {
        let tracker = RequestTracker::new(Store::in_memory());
        let id = tracker.begin("DELETE", "/x", None).await.unwrap();
        tracker
            .finish(&id, Err("vNet is in use".to_string()))
            .await
            .unwrap();
        let record = tracker.get(&id).await.unwrap();
        assert_eq!(record.status, RequestStatus::Error);
        assert_eq!(record.error_message, "vNet is in use");
    }

    #[tokio::test]
    async fn delete_and_list() {
        let tracker = RequestTracker::new(Store::in_memory());
        let a = tracker.begin("GET", "/a", None).await.unwrap();
        let _b = tracker.begin("GET", "/b", None).await.unwrap();

        assert_eq!(tracker.list().await.unwrap().requests.len(), 2);
        tracker.delete(&a).await.unwrap();
        assert_eq!(tracker.list().await.unwrap().requests.len(), 1);
        assert!(matches!(
            tracker.get(&a).await,
            Err(ApiError::NotFound(_))
        ));

        tracker.delete_all().await.unwrap();
        assert!(tracker.list().await.unwrap().requests.is_empty());
    }
}
