//! Shared fixtures: an in-memory upstream and a store that records batch calls.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use swapi_ingest::engine::{RecordStore, SqliteStore};
use swapi_ingest::pipeline::{HttpReply, Upstream};
use swapi_ingest::{BatchOutcome, FlattenedRecord, IngestSettings};

pub const BASE: &str = "https://swapi.test/api/people/";

pub fn people_url(id: u64) -> String {
    format!("{BASE}{id}/")
}

pub fn planet_url(id: u64) -> String {
    format!("https://swapi.test/api/planets/{id}")
}

pub fn film_url(id: u64) -> String {
    format!("https://swapi.test/api/films/{id}")
}

pub fn settings(fallback_total: u64) -> IngestSettings {
    IngestSettings {
        base_url: BASE.to_string(),
        chunk_size: 10,
        fallback_total,
    }
}

enum Canned {
    Reply(u16, String),
    Fail(String),
}

/// Upstream answering from a URL map. Unknown URLs are 404.
#[derive(Default)]
pub struct FakeUpstream {
    routes: HashMap<String, Canned>,
    calls: RefCell<Vec<String>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, url: impl Into<String>, status: u16, body: Value) -> Self {
        self.routes
            .insert(url.into(), Canned::Reply(status, body.to_string()));
        self
    }

    pub fn raw(mut self, url: impl Into<String>, status: u16, body: &str) -> Self {
        self.routes
            .insert(url.into(), Canned::Reply(status, body.to_string()));
        self
    }

    pub fn fail(mut self, url: impl Into<String>, msg: &str) -> Self {
        self.routes.insert(url.into(), Canned::Fail(msg.to_string()));
        self
    }

    pub fn total(self, n: u64) -> Self {
        self.json(BASE, 200, json!({ "message": "ok", "total_records": n }))
    }

    pub fn person(self, id: u64, properties: Value) -> Self {
        self.json(
            people_url(id),
            200,
            json!({ "message": "ok", "result": { "uid": id.to_string(), "properties": properties } }),
        )
    }

    pub fn named(self, url: impl Into<String>, name: &str) -> Self {
        self.json(url, 200, json!({ "result": { "properties": { "name": name } } }))
    }

    pub fn titled(self, url: impl Into<String>, title: &str) -> Self {
        self.json(url, 200, json!({ "result": { "properties": { "title": title } } }))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, url: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == url)
    }
}

impl Upstream for FakeUpstream {
    async fn get(&self, url: &str) -> Result<HttpReply> {
        self.calls.borrow_mut().push(url.to_string());
        tokio::task::yield_now().await;
        match self.routes.get(url) {
            Some(Canned::Reply(status, body)) => Ok(HttpReply {
                status: *status,
                body: body.clone(),
            }),
            Some(Canned::Fail(msg)) => Err(anyhow!("{msg}")),
            None => Ok(HttpReply {
                status: 404,
                body: r#"{"message":"not found"}"#.to_string(),
            }),
        }
    }
}

/// In-memory SQLite store that remembers every batch it was handed.
pub struct RecordingStore {
    pub inner: SqliteStore,
    pub batches: Vec<Vec<FlattenedRecord>>,
    /// Batch indexes whose commit is reported as failed; nothing from them is written.
    pub failing_commits: Vec<usize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            batches: Vec::new(),
            failing_commits: Vec::new(),
        }
    }

    pub fn with_failing_commits(batches: &[usize]) -> Self {
        Self {
            failing_commits: batches.to_vec(),
            ..Self::new()
        }
    }
}

impl RecordStore for RecordingStore {
    async fn init_schema(&mut self) -> Result<()> {
        self.inner.init_schema().await
    }

    async fn insert_batch(&mut self, records: &[FlattenedRecord]) -> Result<BatchOutcome> {
        let index = self.batches.len();
        self.batches.push(records.to_vec());
        if self.failing_commits.contains(&index) {
            return Ok(BatchOutcome {
                inserted: 0,
                skipped: records.len(),
                committed: false,
            });
        }
        self.inner.insert_batch(records).await
    }

    async fn row_count(&mut self) -> Result<u64> {
        self.inner.row_count().await
    }

    async fn close(self) -> Result<()> {
        self.inner.close().await
    }
}

pub fn record(id: &str, name: &str) -> FlattenedRecord {
    FlattenedRecord {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}
