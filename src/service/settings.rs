//! Key/value settings: fold rows into a flat map, upsert one row per key.
//!
//! Writes are not transactional. Keys are upserted one at a time in key order; if one
//! fails, earlier keys stay committed and later keys are not applied.

use crate::config::SettingsConfig;
use crate::error::AppError;
use crate::store::{Datastore, FilterSet, Row};
use serde_json::{Map, Value};

/// JSON type name recorded in the settings `type` column.
pub fn value_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// All settings as `{key: value}`; `{}` when the table is empty. Values are not interpreted.
pub async fn get_settings(store: &dyn Datastore, settings: &SettingsConfig) -> Result<Map<String, Value>, AppError> {
    let rows = store.select(&settings.table, &FilterSet::new(), None).await?;
    let mut out = Map::new();
    for row in rows {
        let Some(key) = row.get(&settings.key_column).and_then(Value::as_str) else {
            tracing::warn!(table = %settings.table, "settings row without a string key, skipped");
            continue;
        };
        let value = row.get(&settings.value_column).cloned().unwrap_or(Value::Null);
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

/// Upsert each key, then return the full settings map.
pub async fn set_settings(
    store: &dyn Datastore,
    settings: &SettingsConfig,
    values: Map<String, Value>,
) -> Result<Map<String, Value>, AppError> {
    for (key, value) in values {
        let mut row = Row::new();
        row.insert(settings.key_column.clone(), Value::String(key.clone()));
        if let Some(type_column) = &settings.type_column {
            row.insert(type_column.clone(), Value::String(value_type(&value).into()));
        }
        row.insert(settings.value_column.clone(), value);
        store
            .upsert(&settings.table, row, &settings.key_column)
            .await
            .inspect_err(|e| tracing::warn!(key = %key, error = %e, "settings write stopped; later keys not applied"))?;
        tracing::debug!(key = %key, "setting stored");
    }
    get_settings(store, settings).await
}
