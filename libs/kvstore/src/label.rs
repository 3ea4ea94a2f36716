// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Per-entity label maps and the label selector.
//!
//! Every labelable entity has a record under `/label/<kind>/<uid>` holding
//! its full label map and the store key of the entity itself. Two reverse
//! indexes — `(kind, key) → uids` and `(kind, key, value) → uids` — are
//! rebuilt from those records on open and kept consistent on every
//! mutation.
//!
//! Selectors are comma-joined AND clauses:
//!
//! | Clause | Match |
//! |---|---|
//! | `k=v` / `k==v` | key present and equal |
//! | `k!=v` | key absent or different |
//! | `k in (v1,v2)` | key present and value in set |
//! | `k notin (v1,v2)` | key absent or value not in set |
//! | `k` / `k exists` | key present |
//! | `!k` / `k !exists` | key absent |

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::store::{Store, StoreError};

/// Label selector and index errors.
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("invalid selector clause: {0:?}")]
    InvalidClause(String),

    #[error("unknown selector operator in clause: {0:?}")]
    UnknownOperator(String),

    #[error("label record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The persisted label record of one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    /// Store key of the entity these labels describe
    pub resource_key: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Default)]
struct Indexes {
    by_kind: HashMap<String, HashSet<String>>,
    by_key: HashMap<(String, String), HashSet<String>>,
    by_key_value: HashMap<(String, String, String), HashSet<String>>,
}

impl Indexes {
    fn insert(&mut self, kind: &str, uid: &str, labels: &BTreeMap<String, String>) {
        self.by_kind
            .entry(kind.to_string())
            .or_default()
            .insert(uid.to_string());
        for (k, v) in labels {
            self.by_key
                .entry((kind.to_string(), k.clone()))
                .or_default()
                .insert(uid.to_string());
            self.by_key_value
                .entry((kind.to_string(), k.clone(), v.clone()))
                .or_default()
                .insert(uid.to_string());
        }
    }

    fn remove(&mut self, kind: &str, uid: &str, labels: &BTreeMap<String, String>) {
        for (k, v) in labels {
            if let Some(set) = self.by_key.get_mut(&(kind.to_string(), k.clone())) {
                set.remove(uid);
            }
            if let Some(set) =
                self.by_key_value
                    .get_mut(&(kind.to_string(), k.clone(), v.clone()))
            {
                set.remove(uid);
            }
        }
    }

    fn drop_entity(&mut self, kind: &str, uid: &str, labels: &BTreeMap<String, String>) {
        self.remove(kind, uid, labels);
        if let Some(set) = self.by_kind.get_mut(kind) {
            set.remove(uid);
        }
    }
}

/// The label index over a [`Store`].
#[derive(Clone)]
pub struct LabelIndex {
    store: Store,
    indexes: Arc<RwLock<Indexes>>,
}

const LABEL_PREFIX: &str = "/label/";

fn label_key(kind: &str, uid: &str) -> String {
    format!("/label/{kind}/{uid}")
}

impl LabelIndex {
    /// Build the index over a store, replaying all persisted label records.
    pub async fn open(store: Store) -> Result<Self, SelectorError> {
        let mut indexes = Indexes::default();
        for entry in store.list(LABEL_PREFIX).await {
            let Some(rest) = entry.key.strip_prefix(LABEL_PREFIX) else {
                continue;
            };
            let Some((kind, uid)) = rest.split_once('/') else {
                continue;
            };
            let record: LabelRecord = serde_json::from_str(&entry.value)?;
            indexes.insert(kind, uid, &record.labels);
        }

        Ok(Self {
            store,
            indexes: Arc::new(RwLock::new(indexes)),
        })
    }

    /// Replace the full label map of an entity and re-derive both reverse
    /// indexes for it.
    pub async fn put_labels(
        &self,
        kind: &str,
        uid: &str,
        resource_key: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<(), SelectorError> {
        let key = label_key(kind, uid);
        let old = self.load_record(&key).await?;

        let record = LabelRecord {
            resource_key: resource_key.to_string(),
            labels,
        };
        self.store
            .put(&key, &serde_json::to_string(&record)?)
            .await?;

        let mut indexes = self.indexes.write().await;
        if let Some(old) = old {
            indexes.remove(kind, uid, &old.labels);
        }
        indexes.insert(kind, uid, &record.labels);
        Ok(())
    }

    /// Remove a single label key from an entity.
    pub async fn remove_label(
        &self,
        kind: &str,
        uid: &str,
        label_name: &str,
    ) -> Result<(), SelectorError> {
        let key = label_key(kind, uid);
        let Some(mut record) = self.load_record(&key).await? else {
            return Ok(());
        };
        let Some(value) = record.labels.remove(label_name) else {
            return Ok(());
        };

        self.store
            .put(&key, &serde_json::to_string(&record)?)
            .await?;

        let mut removed = BTreeMap::new();
        removed.insert(label_name.to_string(), value);
        self.indexes.write().await.remove(kind, uid, &removed);
        Ok(())
    }

    /// Drop the whole label record of an entity (entity deletion).
    pub async fn remove_entity(&self, kind: &str, uid: &str) -> Result<(), SelectorError> {
        let key = label_key(kind, uid);
        let Some(record) = self.load_record(&key).await? else {
            return Ok(());
        };
        self.store.delete(&key).await?;
        self.indexes
            .write()
            .await
            .drop_entity(kind, uid, &record.labels);
        Ok(())
    }

    /// Fetch the label map of an entity.
    pub async fn get_labels(
        &self,
        kind: &str,
        uid: &str,
    ) -> Result<Option<LabelRecord>, SelectorError> {
        self.load_record(&label_key(kind, uid)).await
    }

    /// Evaluate a selector against the current index snapshot and
    /// materialize the matching entities from the store.
    pub async fn select(
        &self,
        kind: &str,
        selector: &str,
    ) -> Result<Vec<serde_json::Value>, SelectorError> {
        let clauses = parse_selector(selector)?;

        // Narrow the candidate set through the reverse indexes when the
        // first clause is affirmative; negative clauses need the full kind
        // partition anyway.
        let candidates: Vec<String> = {
            let indexes = self.indexes.read().await;
            let narrowed = clauses.first().and_then(|c| match c {
                Clause::Eq(k, v) => indexes
                    .by_key_value
                    .get(&(kind.to_string(), k.clone(), v.clone()))
                    .cloned(),
                Clause::Exists(k) | Clause::In(k, _) => {
                    indexes.by_key.get(&(kind.to_string(), k.clone())).cloned()
                }
                _ => None,
            });
            let set = match narrowed {
                Some(set) => set,
                None => indexes.by_kind.get(kind).cloned().unwrap_or_default(),
            };
            let mut uids: Vec<String> = set.into_iter().collect();
            uids.sort();
            uids
        };

        let mut results = Vec::new();
        for uid in candidates {
            let Some(record) = self.load_record(&label_key(kind, &uid)).await? else {
                continue;
            };
            if clauses.iter().all(|c| c.matches(&record.labels)) {
                if let Some(raw) = self.store.get(&record.resource_key).await {
                    results.push(serde_json::from_str(&raw)?);
                }
            }
        }
        Ok(results)
    }

    async fn load_record(&self, key: &str) -> Result<Option<LabelRecord>, SelectorError> {
        match self.store.get(key).await {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Selector grammar
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Eq(String, String),
    Ne(String, String),
    In(String, Vec<String>),
    NotIn(String, Vec<String>),
    Exists(String),
    NotExists(String),
}

impl Clause {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Clause::Eq(k, v) => labels.get(k).is_some_and(|lv| lv == v),
            Clause::Ne(k, v) => labels.get(k).is_none_or(|lv| lv != v),
            Clause::In(k, set) => labels.get(k).is_some_and(|lv| set.contains(lv)),
            Clause::NotIn(k, set) => labels.get(k).is_none_or(|lv| !set.contains(lv)),
            Clause::Exists(k) => labels.contains_key(k),
            Clause::NotExists(k) => !labels.contains_key(k),
        }
    }
}

/// Split a selector on commas outside parentheses.
fn split_clauses(selector: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in selector.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out.retain(|c| !c.is_empty());
    out
}

fn is_bare_key(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

fn parse_set(raw: &str, clause: &str) -> Result<Vec<String>, SelectorError> {
    let inner = raw
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| SelectorError::InvalidClause(clause.to_string()))?;
    let values: Vec<String> = inner
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(SelectorError::InvalidClause(clause.to_string()));
    }
    Ok(values)
}

fn parse_clause(clause: &str) -> Result<Clause, SelectorError> {
    // `!k`
    if let Some(rest) = clause.strip_prefix('!') {
        let key = rest.trim();
        if !is_bare_key(key) {
            return Err(SelectorError::InvalidClause(clause.to_string()));
        }
        return Ok(Clause::NotExists(key.to_string()));
    }

    // `k!=v` (before the `=` branches)
    if let Some((key, value)) = clause.split_once("!=") {
        let (key, value) = (key.trim(), value.trim());
        if !is_bare_key(key) || value.is_empty() {
            return Err(SelectorError::InvalidClause(clause.to_string()));
        }
        return Ok(Clause::Ne(key.to_string(), value.to_string()));
    }

    // `k==v` / `k=v`
    if clause.contains('=') {
        let (key, value) = match clause.split_once("==") {
            Some(pair) => pair,
            None => clause.split_once('=').unwrap(),
        };
        let (key, value) = (key.trim(), value.trim());
        if !is_bare_key(key) || value.is_empty() || value.contains('=') {
            return Err(SelectorError::InvalidClause(clause.to_string()));
        }
        return Ok(Clause::Eq(key.to_string(), value.to_string()));
    }

    // `k in (…)` / `k notin (…)`
    if let Some(paren) = clause.find('(') {
        let head: Vec<&str> = clause[..paren].split_whitespace().collect();
        let set = parse_set(clause[paren..].trim(), clause)?;
        return match head.as_slice() {
            [key, "in"] if is_bare_key(key) => Ok(Clause::In(key.to_string(), set)),
            [key, "notin"] if is_bare_key(key) => Ok(Clause::NotIn(key.to_string(), set)),
            [_, op] => Err(SelectorError::UnknownOperator(op.to_string())),
            _ => Err(SelectorError::InvalidClause(clause.to_string())),
        };
    }

    // bare key / `k exists` / `k !exists`
    let tokens: Vec<&str> = clause.split_whitespace().collect();
    match tokens.as_slice() {
        [key] if is_bare_key(key) => Ok(Clause::Exists(key.to_string())),
        [key, "exists"] if is_bare_key(key) => Ok(Clause::Exists(key.to_string())),
        [key, "!exists"] if is_bare_key(key) => Ok(Clause::NotExists(key.to_string())),
        [_, op] => Err(SelectorError::UnknownOperator(op.to_string())),
        _ => Err(SelectorError::InvalidClause(clause.to_string())),
    }
}

fn parse_selector(selector: &str) -> Result<Vec<Clause>, SelectorError> {
    split_clauses(selector)
        .iter()
        .map(|c| parse_clause(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_all_operators() {
        assert_eq!(
            parse_clause("env=prod").unwrap(),
            Clause::Eq("env".into(), "prod".into())
        );
        assert_eq!(
            parse_clause("env==prod").unwrap(),
            Clause::Eq("env".into(), "prod".into())
        );
        assert_eq!(
            parse_clause("env!=prod").unwrap(),
            Clause::Ne("env".into(), "prod".into())
        );
        assert_eq!(
            parse_clause("tier in (api, db)").unwrap(),
            Clause::In("tier".into(), vec!["api".into(), "db".into()])
        );
        assert_eq!(
            parse_clause("env notin (prod,staging)").unwrap(),
            Clause::NotIn("env".into(), vec!["prod".into(), "staging".into()])
        );
        assert_eq!(parse_clause("env").unwrap(), Clause::Exists("env".into()));
        assert_eq!(
            parse_clause("env exists").unwrap(),
            Clause::Exists("env".into())
        );
        assert_eq!(
            parse_clause("!tier").unwrap(),
            Clause::NotExists("tier".into())
        );
        assert_eq!(
            parse_clause("tier !exists").unwrap(),
            Clause::NotExists("tier".into())
        );
    }

    #[test]
    fn rejects_unknown_operators() {
        assert!(matches!(
            parse_clause("env >= prod"),
            Err(SelectorError::InvalidClause(_)) | Err(SelectorError::UnknownOperator(_))
        ));
        assert!(matches!(
            parse_clause("tier within (a,b)"),
            Err(SelectorError::UnknownOperator(_))
        ));
        assert!(parse_clause("=prod").is_err());
        assert!(parse_clause("tier in ()").is_err());
        assert!(parse_clause("env>prod").is_err());
    }

    #[test]
    fn selector_splits_outside_parens_only() {
        let clauses = split_clauses("env=prod,tier in (api,db),!stage");
        assert_eq!(clauses, vec!["env=prod", "tier in (api,db)", "!stage"]);
    }

    #[test]
    fn clause_semantics() {
        let l = labels(&[("env", "prod"), ("tier", "api")]);

        assert!(Clause::Eq("env".into(), "prod".into()).matches(&l));
        assert!(!Clause::Eq("env".into(), "dev".into()).matches(&l));
        // `!=` matches when the key is absent
        assert!(Clause::Ne("missing".into(), "x".into()).matches(&l));
        assert!(Clause::NotIn("missing".into(), vec!["x".into()]).matches(&l));
        assert!(!Clause::In("missing".into(), vec!["x".into()]).matches(&l));
        assert!(Clause::NotExists("missing".into()).matches(&l));
        assert!(!Clause::NotExists("env".into()).matches(&l));
    }

    async fn seeded_index() -> (Store, LabelIndex) {
        let store = Store::in_memory();
        for (id, labels_json) in [
            ("e1", r#"{"env":"prod","tier":"api"}"#),
            ("e2", r#"{"env":"prod","tier":"db"}"#),
            ("e3", r#"{"env":"dev"}"#),
        ] {
            store
                .put(
                    &format!("/ns/default/resources/vNet/{id}"),
                    &format!(r#"{{"Id":"{id}"}}"#),
                )
                .await
                .unwrap();
        }
        let index = LabelIndex::open(store.clone()).await.unwrap();
        for (id, raw) in [
            ("u1", ("e1", r#"{"env":"prod","tier":"api"}"#)),
            ("u2", ("e2", r#"{"env":"prod","tier":"db"}"#)),
            ("u3", ("e3", r#"{"env":"dev"}"#)),
        ] {
            let (entity, labels_raw) = raw;
            let labels: BTreeMap<String, String> = serde_json::from_str(labels_raw).unwrap();
            index
                .put_labels(
                    "vNet",
                    id,
                    &format!("/ns/default/resources/vNet/{entity}"),
                    labels,
                )
                .await
                .unwrap();
        }
        (store, index)
    }

    fn ids(results: &[serde_json::Value]) -> Vec<String> {
        let mut ids: Vec<String> = results
            .iter()
            .map(|v| v["Id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn select_equality_and_set() {
        let (_store, index) = seeded_index().await;
        let hit = index
            .select("vNet", "env=prod,tier in (api,db)")
            .await
            .unwrap();
        assert_eq!(ids(&hit), vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn select_negation_combinations() {
        let (_store, index) = seeded_index().await;

        // env!=prod matches only e3, but e3 has no tier, so the AND is empty
        let hit = index.select("vNet", "env!=prod,tier exists").await.unwrap();
        assert!(hit.is_empty());

        let hit = index.select("vNet", "!tier").await.unwrap();
        assert_eq!(ids(&hit), vec!["e3"]);
    }

    #[tokio::test]
    async fn select_empty_selector_matches_kind() {
        let (_store, index) = seeded_index().await;
        let hit = index.select("vNet", "").await.unwrap();
        assert_eq!(hit.len(), 3);
        let hit = index.select("sshKey", "").await.unwrap();
        assert!(hit.is_empty());
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = Store::in_memory();
        let index = LabelIndex::open(store).await.unwrap();
        let l = labels(&[("env", "prod"), ("owner", "team-a")]);
        index
            .put_labels("mci", "u9", "/ns/default/mci/m1", l.clone())
            .await
            .unwrap();
        let record = index.get_labels("mci", "u9").await.unwrap().unwrap();
        assert_eq!(record.labels, l);
        assert_eq!(record.resource_key, "/ns/default/mci/m1");
    }

    #[tokio::test]
    async fn remove_label_updates_indexes() {
        let (_store, index) = seeded_index().await;
        index.remove_label("vNet", "u1", "tier").await.unwrap();

        let hit = index.select("vNet", "tier exists").await.unwrap();
        assert_eq!(ids(&hit), vec!["e2"]);

        // removing an absent key is a no-op
        index.remove_label("vNet", "u1", "tier").await.unwrap();
    }

    #[tokio::test]
    async fn indexes_rebuilt_on_open() {
        let (store, index) = seeded_index().await;
        drop(index);
        let reopened = LabelIndex::open(store).await.unwrap();
        let hit = reopened.select("vNet", "env=prod").await.unwrap();
        assert_eq!(ids(&hit), vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn remove_entity_drops_from_selection() {
        let (_store, index) = seeded_index().await;
        index.remove_entity("vNet", "u2").await.unwrap();
        let hit = index.select("vNet", "env=prod").await.unwrap();
        assert_eq!(ids(&hit), vec!["e1"]);
        assert!(index.get_labels("vNet", "u2").await.unwrap().is_none());
    }
}
