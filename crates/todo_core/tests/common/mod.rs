//! Scripted Remote Store doubles shared by integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use todo_core::{
    RemoteError, RemoteResult, RemoteStore, Row, SelectQuery, SqliteTableStore, Table, TodoDraft,
};

/// Remote Store that rejects every call.
pub struct DownStore;

#[async_trait]
impl RemoteStore for DownStore {
    async fn select(&self, _table: Table, _query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        Err(RemoteError::Unavailable("connection refused".to_string()))
    }

    async fn insert(&self, _table: Table, _row: Row) -> RemoteResult<()> {
        Err(RemoteError::Unavailable("connection refused".to_string()))
    }

    async fn update(&self, _table: Table, _patch: Row, _id: &str) -> RemoteResult<()> {
        Err(RemoteError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _table: Table, _id: &str) -> RemoteResult<()> {
        Err(RemoteError::Unavailable("connection refused".to_string()))
    }
}

/// Remote Store that never answers within any sane deadline.
pub struct HungStore;

#[async_trait]
impl RemoteStore for HungStore {
    async fn select(&self, _table: Table, _query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn insert(&self, _table: Table, _row: Row) -> RemoteResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn update(&self, _table: Table, _patch: Row, _id: &str) -> RemoteResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn delete(&self, _table: Table, _id: &str) -> RemoteResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// SQLite-backed Remote Store with per-operation fault switches.
pub struct FlakyStore {
    inner: SqliteTableStore,
    pub fail_select: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteTableStore::open_in_memory().expect("in-memory sqlite should open"),
            fail_select: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    /// Flips every fault switch at once.
    pub fn set_down(&self, down: bool) {
        for switch in [
            &self.fail_select,
            &self.fail_insert,
            &self.fail_update,
            &self.fail_delete,
        ] {
            switch.store(down, Ordering::SeqCst);
        }
    }

    pub fn inner(&self) -> &SqliteTableStore {
        &self.inner
    }

    /// Inserts a user directly and returns its id.
    pub async fn seed_user(&self, id: &str) -> String {
        let row = json!({ "id": id, "username": "ada", "email": "ada@example.com" });
        self.inner
            .insert(Table::Users, row.as_object().cloned().unwrap())
            .await
            .expect("user seed should insert");
        id.to_string()
    }

    fn gate(&self, switch: &AtomicBool) -> RemoteResult<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn select(&self, table: Table, query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        self.gate(&self.fail_select)?;
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: Table, row: Row) -> RemoteResult<()> {
        self.gate(&self.fail_insert)?;
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: Table, patch: Row, id: &str) -> RemoteResult<()> {
        self.gate(&self.fail_update)?;
        self.inner.update(table, patch, id).await
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        self.gate(&self.fail_delete)?;
        self.inner.delete(table, id).await
    }
}

pub const CREATOR_ID: &str = "8d1c0f57-3d5e-4a57-9d0b-7b7fb1b3c0a1";

pub fn draft(name: &str) -> TodoDraft {
    TodoDraft::new(name, "low", CREATOR_ID).with_status("pending")
}
