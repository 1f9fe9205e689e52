//! Datastore over a PostgreSQL pool.

use crate::error::DatastoreError;
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::store::{Datastore, FilterSet, OrderDirective, Row};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, q: &QueryBuf) -> Result<Vec<Row>, DatastoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, Value>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let values = query.fetch_all(&self.pool).await?;
        values.into_iter().map(into_row).collect()
    }

    async fn fetch_one_row(&self, q: &QueryBuf) -> Result<Row, DatastoreError> {
        self.fetch_rows(q)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatastoreError::Sqlx(sqlx::Error::RowNotFound))
    }
}

fn into_row(value: Value) -> Result<Row, DatastoreError> {
    match value {
        Value::Object(m) => Ok(m),
        other => Err(DatastoreError::Rejected(format!("expected a row object, got {}", other))),
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn select(
        &self,
        table: &str,
        filters: &FilterSet,
        order: Option<&OrderDirective>,
    ) -> Result<Vec<Row>, DatastoreError> {
        self.fetch_rows(&sql::select(table, filters, order)).await
    }

    async fn count(&self, table: &str, filters: &FilterSet) -> Result<u64, DatastoreError> {
        let q = sql::count(table, filters);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, DatastoreError> {
        self.fetch_one_row(&sql::insert(table, &row)).await
    }

    async fn update(&self, table: &str, filters: &FilterSet, patch: Row) -> Result<Vec<Row>, DatastoreError> {
        self.fetch_rows(&sql::update(table, filters, &patch)).await
    }

    async fn delete(&self, table: &str, filters: &FilterSet) -> Result<u64, DatastoreError> {
        let q = sql::delete(table, filters);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn upsert(&self, table: &str, row: Row, conflict_column: &str) -> Result<Row, DatastoreError> {
        self.fetch_one_row(&sql::upsert(table, &row, conflict_column)).await
    }

    async fn ping(&self) -> Result<(), DatastoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
