//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE and upsert statements.
//!
//! Rows come back as `to_jsonb(t)`. Written values travel as one JSON parameter
//! expanded by `json_populate_record`, so Postgres coerces them to column types.

use crate::store::{FilterSet, OrderDirective, Row};
use serde_json::Value;

const ALIAS: &str = "t";

/// Quote identifier for PostgreSQL (safe: only from config or payload keys).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table name, optionally schema-qualified as `schema.table`.
fn qualified_table(table: &str) -> String {
    table.split('.').map(quoted).collect::<Vec<_>>().join(".")
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// WHERE clause for equality filters. Strings compare against the column's text form,
/// so ids and enum-like values match whatever the column type is.
fn where_clause(q: &mut QueryBuf, filters: &FilterSet) -> String {
    let parts: Vec<String> = filters
        .iter()
        .map(|f| {
            let col = format!("{}.{}", ALIAS, quoted(&f.column));
            match &f.value {
                Value::Null => format!("{} IS NULL", col),
                Value::String(_) => {
                    let n = q.push_param(f.value.clone());
                    format!("{}::text = ${}", col, n)
                }
                Value::Array(_) | Value::Object(_) => {
                    let n = q.push_param(f.value.clone());
                    format!("to_jsonb({}) = ${}", col, n)
                }
                Value::Bool(_) | Value::Number(_) => {
                    let n = q.push_param(f.value.clone());
                    format!("{} = ${}", col, n)
                }
            }
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn order_clause(order: Option<&OrderDirective>) -> String {
    order
        .map(|o| {
            format!(
                " ORDER BY {}.{} {} {}",
                ALIAS,
                quoted(&o.column),
                if o.ascending { "ASC" } else { "DESC" },
                if o.nulls_first { "NULLS FIRST" } else { "NULLS LAST" }
            )
        })
        .unwrap_or_default()
}

fn column_list(row: &Row) -> String {
    row.keys().map(|k| quoted(k)).collect::<Vec<_>>().join(", ")
}

pub fn select(table: &str, filters: &FilterSet, order: Option<&OrderDirective>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, filters);
    q.sql = format!(
        "SELECT to_jsonb({a}) FROM {} {a}{}{}",
        qualified_table(table),
        where_sql,
        order_clause(order),
        a = ALIAS
    );
    q
}

pub fn count(table: &str, filters: &FilterSet) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, filters);
    q.sql = format!("SELECT COUNT(*) FROM {} {}{}", qualified_table(table), ALIAS, where_sql);
    q
}

/// INSERT only the columns present in `row`, so omitted columns take their DB defaults.
pub fn insert(table: &str, row: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified_table(table);
    if row.is_empty() {
        q.sql = format!("INSERT INTO {} AS {a} DEFAULT VALUES RETURNING to_jsonb({a})", target, a = ALIAS);
        return q;
    }
    let n = q.push_param(Value::Object(row.clone()));
    let cols = column_list(row);
    q.sql = format!(
        "INSERT INTO {t} AS {a} ({c}) SELECT {c} FROM json_populate_record(NULL::{t}, ${n}::json) RETURNING to_jsonb({a})",
        t = target,
        a = ALIAS,
        c = cols,
        n = n
    );
    q
}

/// UPDATE matching rows, SET only the columns present in `patch`.
/// An empty patch degrades to a SELECT of the matching rows.
pub fn update(table: &str, filters: &FilterSet, patch: &Row) -> QueryBuf {
    if patch.is_empty() {
        return select(table, filters, None);
    }
    let mut q = QueryBuf::new();
    let target = qualified_table(table);
    let n = q.push_param(Value::Object(patch.clone()));
    let sets = patch
        .keys()
        .map(|k| format!("{c} = r.{c}", c = quoted(k)))
        .collect::<Vec<_>>()
        .join(", ");
    let where_sql = where_clause(&mut q, filters);
    q.sql = format!(
        "UPDATE {t} AS {a} SET {s} FROM json_populate_record(NULL::{t}, ${n}::json) AS r{w} RETURNING to_jsonb({a})",
        t = target,
        a = ALIAS,
        s = sets,
        n = n,
        w = where_sql
    );
    q
}

pub fn delete(table: &str, filters: &FilterSet) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, filters);
    q.sql = format!("DELETE FROM {} AS {}{}", qualified_table(table), ALIAS, where_sql);
    q
}

/// INSERT ... ON CONFLICT (key) DO UPDATE every supplied column.
pub fn upsert(table: &str, row: &Row, conflict_column: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified_table(table);
    let n = q.push_param(Value::Object(row.clone()));
    let cols = column_list(row);
    let sets = row
        .keys()
        .map(|k| format!("{c} = EXCLUDED.{c}", c = quoted(k)))
        .collect::<Vec<_>>()
        .join(", ");
    q.sql = format!(
        "INSERT INTO {t} AS {a} ({c}) SELECT {c} FROM json_populate_record(NULL::{t}, ${n}::json) \
         ON CONFLICT ({k}) DO UPDATE SET {s} RETURNING to_jsonb({a})",
        t = target,
        a = ALIAS,
        c = cols,
        n = n,
        k = quoted(conflict_column),
        s = sets
    );
    q
}
