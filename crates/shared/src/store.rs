//! Record Store Client
//!
//! The relational backend is an external collaborator. This module defines the
//! seam it is reached through:
//! - [`RecordStore`]: per-table `select` / `insert` / `update` over JSON rows
//! - [`StoreClient`]: the handle every coordinator uses, which bounds each call
//!   with the configured timeout and traces it
//! - [`decode_row`] / [`encode_row`]: the typed boundary. Entity structs are
//!   declared with `deny_unknown_fields`, so a row carrying columns the entity
//!   does not know about is rejected instead of silently dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use derive_more::{Display, From};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::StoreSettings;
use crate::error::{HmsError, HmsResult, StoreError};

/// A row as exchanged with the store: column name to JSON value
pub type Row = Map<String, Value>;

/// Opaque store-assigned key of a row
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        RecordKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey(key.to_string())
    }
}

impl From<&RecordKey> for Value {
    fn from(key: &RecordKey) -> Self {
        Value::String(key.0.clone())
    }
}

/// Tables reachable through the store client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Table {
    #[display(fmt = "patients")]
    Patients,
    #[display(fmt = "doctors")]
    Doctors,
    #[display(fmt = "prescriptions")]
    Prescriptions,
    #[display(fmt = "lab_reports")]
    LabReports,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Patients,
        Table::Doctors,
        Table::Prescriptions,
        Table::LabReports,
    ];

    /// Columns the table accepts
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Patients => &[
                "id",
                "patient_number",
                "full_name",
                "date_of_birth",
                "gender",
                "contact_number",
                "address",
                "created_at",
            ],
            Table::Doctors => &["id", "full_name", "specialization", "created_at"],
            Table::Prescriptions => &[
                "id",
                "patient_id",
                "doctor_id",
                "diagnosis",
                "prescription_text",
                "visit_date",
                "created_at",
            ],
            Table::LabReports => &[
                "id",
                "patient_id",
                "test_name",
                "test_result",
                "notes",
                "test_date",
                "created_at",
            ],
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }
}

/// Row predicate
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
    /// `column IN (values)`
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq { column, value } => row.get(column) == Some(value),
            Filter::In { column, values } => row
                .get(column)
                .map(|v| values.contains(v))
                .unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Filters, ordering and limit for a `select`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn any_of(mut self, column: &str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values,
        });
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Client for a remote relational store
///
/// Implementations must report failures as `StoreError`, never as an empty
/// result. `insert` and `update` return the row as stored, including any
/// store-assigned defaults.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Row>, StoreError>;

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    async fn update(&self, table: Table, key: &RecordKey, patch: Row) -> Result<Row, StoreError>;
}

/// Timeout-bounded handle on a [`RecordStore`]
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    pub fn new(inner: Arc<dyn RecordStore>, settings: &StoreSettings) -> Self {
        Self::with_timeout(inner, settings.timeout())
    }

    pub fn with_timeout(inner: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn select(&self, table: Table, query: Query) -> Result<Vec<Row>, StoreError> {
        debug!(%table, filters = query.filters.len(), limit = ?query.limit, "select");
        self.bounded(self.inner.select(table, query)).await
    }

    pub async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        debug!(%table, columns = row.len(), "insert");
        self.bounded(self.inner.insert(table, row)).await
    }

    pub async fn update(
        &self,
        table: Table,
        key: &RecordKey,
        patch: Row,
    ) -> Result<Row, StoreError> {
        debug!(%table, %key, columns = patch.len(), "update");
        self.bounded(self.inner.update(table, key, patch)).await
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Decode a store row into a typed entity
pub fn decode_row<T: DeserializeOwned>(table: Table, row: Row) -> HmsResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| HmsError::Schema {
        table,
        reason: e.to_string(),
    })
}

/// Decode every row, failing on the first mismatch
pub fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> HmsResult<Vec<T>> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

/// Encode a typed insert or patch into a store row
pub fn encode_row<T: Serialize>(table: Table, value: &T) -> HmsResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(HmsError::Schema {
            table,
            reason: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(HmsError::Schema {
            table,
            reason: e.to_string(),
        }),
    }
}
