//! In-memory record store
//!
//! Behaves like the hosted relational backend as far as the front desk can
//! observe: store-assigned `id` / `created_at` (and prescriptions' `visit_date`)
//! defaults, a unique `patients.patient_number`, foreign keys from prescriptions
//! and lab reports, a column whitelist per table, ordering and limits.
//! Used by tests and demos; it is not a storage engine.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{Query, RecordKey, RecordStore, Row, Table};

/// Columns that must be unique per table
const UNIQUE_COLUMNS: &[(Table, &str)] = &[(Table::Patients, "patient_number")];

/// (table, column, referenced table)
const FOREIGN_KEYS: &[(Table, &str, Table)] = &[
    (Table::Prescriptions, "patient_id", Table::Patients),
    (Table::Prescriptions, "doctor_id", Table::Doctors),
    (Table::LabReports, "patient_id", Table::Patients),
];

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, Vec<Row>>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    fn rows(&self, table: Table) -> &[Row] {
        self.rows.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Strictly increasing creation stamps, even for inserts within one clock tick
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn key_exists(&self, table: Table, key: &Value) -> bool {
        self.rows(table).iter().any(|row| row.get("id") == Some(key))
    }

    fn check_columns(table: Table, row: &Row) -> Result<(), StoreError> {
        match row.keys().find(|column| !table.has_column(column)) {
            Some(column) => Err(StoreError::Rejected(format!(
                "column {}.{} does not exist",
                table, column
            ))),
            None => Ok(()),
        }
    }

    fn check_constraints(&self, table: Table, row: &Row, skip_id: Option<&Value>) -> Result<(), StoreError> {
        for (unique_table, column) in UNIQUE_COLUMNS {
            if *unique_table != table {
                continue;
            }
            let Some(value) = row.get(*column) else { continue };
            let clash = self.rows(table).iter().any(|existing| {
                existing.get(*column) == Some(value) && existing.get("id") != skip_id
            });
            if clash {
                return Err(StoreError::UniqueViolation {
                    table,
                    column: column.to_string(),
                });
            }
        }

        for (fk_table, column, referenced) in FOREIGN_KEYS {
            if *fk_table != table {
                continue;
            }
            match row.get(*column) {
                Some(value) if self.key_exists(*referenced, value) => {}
                _ => {
                    return Err(StoreError::ForeignKeyViolation {
                        table,
                        column: column.to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

/// Record store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held in `table`
    pub async fn row_count(&self, table: Table) -> usize {
        self.tables.lock().await.rows(table).len()
    }

    /// Copy of every row in `table`, in insertion order
    pub async fn dump(&self, table: Table) -> Vec<Row> {
        self.tables.lock().await.rows(table).to_vec()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Row>, StoreError> {
        if let Some(filter) = query.filters.iter().find(|f| !table.has_column(f.column())) {
            return Err(StoreError::Rejected(format!(
                "column {}.{} does not exist",
                table,
                filter.column()
            )));
        }

        let tables = self.tables.lock().await;
        let mut rows: Vec<Row> = tables
            .rows(table)
            .iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            if !table.has_column(&order.column) {
                return Err(StoreError::Rejected(format!(
                    "cannot order by unknown column {}.{}",
                    table, order.column
                )));
            }
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        Tables::check_columns(table, &row)?;
        if let Some(column) = ["id", "created_at"].into_iter().find(|c| row.contains_key(*c)) {
            return Err(StoreError::Rejected(format!(
                "{}.{} is assigned by the store",
                table, column
            )));
        }

        let mut tables = self.tables.lock().await;
        tables.check_constraints(table, &row, None)?;

        let stamp = tables
            .next_stamp()
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        row.insert("created_at".to_string(), Value::String(stamp.clone()));
        if table == Table::Prescriptions {
            row.entry("visit_date".to_string())
                .or_insert_with(|| Value::String(stamp.clone()));
        }

        tables.rows.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, key: &RecordKey, patch: Row) -> Result<Row, StoreError> {
        Tables::check_columns(table, &patch)?;
        if let Some(column) = ["id", "created_at"].into_iter().find(|c| patch.contains_key(*c)) {
            return Err(StoreError::Rejected(format!("{}.{} cannot be updated", table, column)));
        }

        let mut tables = self.tables.lock().await;
        let key_value = Value::from(key);
        let position = tables
            .rows(table)
            .iter()
            .position(|row| row.get("id") == Some(&key_value))
            .ok_or_else(|| StoreError::RowNotFound {
                table,
                key: key.clone(),
            })?;

        let mut updated = tables.rows(table)[position].clone();
        for (column, value) in patch {
            updated.insert(column, value);
        }
        tables.check_constraints(table, &updated, Some(&key_value))?;

        if let Some(rows) = tables.rows.get_mut(&table) {
            rows[position] = updated.clone();
        }
        Ok(updated)
    }
}

/// Ordering over JSON column values: nulls first, RFC 3339 timestamps by instant
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
