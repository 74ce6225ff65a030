//! Fault-injecting record store
//!
//! Wraps the in-memory store and lets a test fail or delay calls per table
//! and operation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hms_shared::{InMemoryStore, Query, RecordKey, RecordStore, Row, StoreError, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
}

#[derive(Clone, Debug)]
pub enum Fault {
    /// Answer with this error instead of reaching the store
    Fail(StoreError),
    /// Sleep before reaching the store
    Delay(Duration),
}

#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    faults: Mutex<HashMap<(Table, Op), Fault>>,
    calls: Mutex<Vec<(Table, Op)>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, table: Table, op: Op, fault: Fault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert((table, op), fault);
        }
    }

    pub fn heal(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    /// Every call that reached this wrapper, in order
    pub fn calls(&self) -> Vec<(Table, Op)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, table: Table, op: Op) -> usize {
        self.calls().iter().filter(|c| **c == (table, op)).count()
    }

    async fn before(&self, table: Table, op: Op) -> Result<(), StoreError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((table, op));
        }
        let fault = self
            .faults
            .lock()
            .ok()
            .and_then(|faults| faults.get(&(table, op)).cloned());

        match fault {
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Row>, StoreError> {
        self.before(table, Op::Select).await?;
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        self.before(table, Op::Insert).await?;
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: Table, key: &RecordKey, patch: Row) -> Result<Row, StoreError> {
        self.before(table, Op::Update).await?;
        self.inner.update(table, key, patch).await
    }
}
