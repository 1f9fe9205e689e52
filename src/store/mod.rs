//! Datastore adapter seam: table-scoped CRUD with equality filters, ordering and counts.

mod filter;
pub mod memory;
pub mod postgres;

pub use filter::{Filter, FilterSet, OrderDirective};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::DatastoreError;
use async_trait::async_trait;

/// One table row as a JSON object keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Generic table operations. Adapters own type matching between JSON values and
/// column types, and row-level consistency.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn select(
        &self,
        table: &str,
        filters: &FilterSet,
        order: Option<&OrderDirective>,
    ) -> Result<Vec<Row>, DatastoreError>;

    async fn count(&self, table: &str, filters: &FilterSet) -> Result<u64, DatastoreError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, DatastoreError>;

    /// Apply `patch` to every matching row; returns the updated rows (empty when none matched).
    async fn update(&self, table: &str, filters: &FilterSet, patch: Row) -> Result<Vec<Row>, DatastoreError>;

    /// Returns the number of deleted rows.
    async fn delete(&self, table: &str, filters: &FilterSet) -> Result<u64, DatastoreError>;

    /// Insert or replace keyed on `conflict_column`.
    async fn upsert(&self, table: &str, row: Row, conflict_column: &str) -> Result<Row, DatastoreError>;

    async fn ping(&self) -> Result<(), DatastoreError>;
}
