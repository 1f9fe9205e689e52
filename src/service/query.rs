//! Query builder for list reads: default filter, translated parameters, ordering.

use crate::config::{ResourceConfig, ResourceRegistry};
use crate::error::AppError;
use crate::store::{Datastore, FilterSet, OrderDirective};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameter value that disables filtering on its column.
pub const ALL: &str = "all";

#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub table: String,
    pub filters: FilterSet,
    pub order: Option<OrderDirective>,
}

/// `"true"`/`"false"` become booleans; every other value stays a string.
pub fn coerce_param(value: &str) -> Value {
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

pub fn build_list_query(
    registry: &ResourceRegistry,
    entry: &ResourceConfig,
    params: &BTreeMap<String, String>,
) -> ListQuery {
    let mut filters = FilterSet::new();

    if let Some(default) = &entry.default_filter {
        let suppressed = params
            .iter()
            .any(|(name, value)| value == ALL && registry.column_for_param(name) == default.column);
        if !suppressed {
            filters.set(default.column.clone(), default.value.clone());
        }
    }

    for (name, value) in params {
        if value == ALL {
            continue;
        }
        filters.set(registry.column_for_param(name), coerce_param(value));
    }

    ListQuery {
        table: entry.table.clone(),
        filters,
        order: entry
            .order
            .as_ref()
            .map(|o| OrderDirective::nulls_last(o.column.clone(), o.ascending)),
    }
}

/// Run a list read. No matches is an empty vector, never an error.
pub async fn list(
    store: &dyn Datastore,
    registry: &ResourceRegistry,
    entry: &ResourceConfig,
    params: &BTreeMap<String, String>,
) -> Result<Vec<Value>, AppError> {
    let query = build_list_query(registry, entry, params);
    let rows = store
        .select(&query.table, &query.filters, query.order.as_ref())
        .await?;
    Ok(rows.into_iter().map(Value::Object).collect())
}
