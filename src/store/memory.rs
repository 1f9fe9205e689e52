//! In-process datastore for tests and running the site without a database.
//! Inserts fill `id` (uuid v4) and `created_at` when absent, as column defaults would.

use crate::error::DatastoreError;
use crate::store::{Datastore, FilterSet, OrderDirective, Row};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to `table` as-is. Non-object values are skipped.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) -> Result<(), DatastoreError> {
        let mut tables = self.write()?;
        let target = tables.entry(table.to_string()).or_default();
        target.extend(rows.into_iter().filter_map(|v| match v {
            Value::Object(m) => Some(m),
            _ => None,
        }));
        Ok(())
    }

    pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Value>) -> Result<Self, DatastoreError> {
        self.seed(table, rows)?;
        Ok(self)
    }

    /// Snapshot of a table in insertion order.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>, DatastoreError> {
        Ok(self.read()?.get(table).cloned().unwrap_or_default())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<Row>>>, DatastoreError> {
        self.tables
            .read()
            .map_err(|_| DatastoreError::Rejected("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<Row>>>, DatastoreError> {
        self.tables
            .write()
            .map_err(|_| DatastoreError::Rejected("memory store lock poisoned".into()))
    }
}

/// Equality with the loose type matching a SQL engine applies to string parameters.
fn cell_matches(cell: Option<&Value>, expected: &Value) -> bool {
    let cell = cell.unwrap_or(&Value::Null);
    if cell == expected {
        return true;
    }
    match (cell, expected) {
        (Value::Number(n), Value::String(s)) => n.to_string() == *s,
        (Value::Bool(b), Value::String(s)) => b.to_string() == *s,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => false,
    }
}

fn row_matches(row: &Row, filters: &FilterSet) -> bool {
    filters.iter().all(|f| cell_matches(row.get(&f.column), &f.value))
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_rows(a: &Row, b: &Row, order: &OrderDirective) -> Ordering {
    let a = a.get(&order.column).filter(|v| !v.is_null());
    let b = b.get(&order.column).filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) if order.nulls_first => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) if order.nulls_first => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_present(x, y);
            if order.ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}

/// Fill column defaults and append, rejecting a duplicate `id`. Caller holds the write guard.
fn push_row(rows: &mut Vec<Row>, table: &str, mut row: Row) -> Result<Row, DatastoreError> {
    row.entry("id")
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
    if rows.iter().any(|r| r.get("id") == row.get("id")) {
        return Err(DatastoreError::Rejected(format!(
            "duplicate key value violates unique constraint \"{}_pkey\"",
            table
        )));
    }
    rows.push(row.clone());
    Ok(row)
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filters: &FilterSet,
        order: Option<&OrderDirective>,
    ) -> Result<Vec<Row>, DatastoreError> {
        let tables = self.read()?;
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| row_matches(r, filters)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| compare_rows(a, b, order));
        }
        Ok(rows)
    }

    async fn count(&self, table: &str, filters: &FilterSet) -> Result<u64, DatastoreError> {
        let tables = self.read()?;
        let n = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| row_matches(r, filters)).count())
            .unwrap_or(0);
        Ok(n as u64)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, DatastoreError> {
        let mut tables = self.write()?;
        push_row(tables.entry(table.to_string()).or_default(), table, row)
    }

    async fn update(&self, table: &str, filters: &FilterSet, patch: Row) -> Result<Vec<Row>, DatastoreError> {
        let mut tables = self.write()?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| row_matches(r, filters)) {
            for (k, v) in &patch {
                row.insert(k.clone(), v.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &FilterSet) -> Result<u64, DatastoreError> {
        let mut tables = self.write()?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !row_matches(r, filters));
        Ok((before - rows.len()) as u64)
    }

    async fn upsert(&self, table: &str, row: Row, conflict_column: &str) -> Result<Row, DatastoreError> {
        let key = row.get(conflict_column).cloned().ok_or_else(|| {
            DatastoreError::Rejected(format!("upsert row has no '{}' value", conflict_column))
        })?;
        let mut tables = self.write()?;
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(existing) = rows.iter_mut().find(|r| r.get(conflict_column) == Some(&key)) {
            for (k, v) in row {
                existing.insert(k, v);
            }
            return Ok(existing.clone());
        }
        push_row(rows, table, row)
    }

    async fn ping(&self) -> Result<(), DatastoreError> {
        self.read().map(|_| ())
    }
}
