//! Mutation pipeline: create, update and delete with per-table field defaults.

use crate::config::{MutationRules, ResourceConfig};
use crate::error::AppError;
use crate::store::{Datastore, FilterSet, Row};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Null, missing and empty-string timestamps count as unset.
fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Fill defaults for fields the payload omits: publish flag and time, active flag.
pub fn apply_create_defaults(rules: &MutationRules, payload: &mut Row, now: DateTime<Utc>) {
    if let Some(publish) = &rules.publish {
        if !payload.contains_key(&publish.flag_column) {
            payload.insert(publish.flag_column.clone(), Value::Bool(true));
        }
        if !payload.contains_key(&publish.timestamp_column) {
            payload.insert(publish.timestamp_column.clone(), timestamp(now));
        }
    }
    if let Some(active) = &rules.active_column {
        if !payload.contains_key(active) {
            payload.insert(active.clone(), Value::Bool(true));
        }
    }
}

/// Column that needs the current row's publish timestamp before the update can be finalized.
/// Only when the payload publishes the row without supplying a timestamp.
pub fn publish_timestamp_to_check<'a>(rules: &'a MutationRules, payload: &Row) -> Option<&'a str> {
    let publish = rules.publish.as_ref()?;
    let publishing = payload.get(&publish.flag_column) == Some(&Value::Bool(true));
    (publishing && is_blank(payload.get(&publish.timestamp_column))).then_some(publish.timestamp_column.as_str())
}

/// Stamp the touch column unless the caller set it.
pub fn apply_update_stamps(rules: &MutationRules, payload: &mut Row, now: DateTime<Utc>) {
    if let Some(touch) = &rules.touch_column {
        if !payload.contains_key(touch) {
            payload.insert(touch.clone(), timestamp(now));
        }
    }
}

fn id_filter(entry: &ResourceConfig, id: &str) -> FilterSet {
    FilterSet::eq(entry.id_column.clone(), id)
}

pub async fn create(store: &dyn Datastore, entry: &ResourceConfig, mut payload: Row) -> Result<Value, AppError> {
    apply_create_defaults(&entry.mutations, &mut payload, Utc::now());
    let row = store.insert(&entry.table, payload).await?;
    tracing::info!(table = %entry.table, "row created");
    Ok(Value::Object(row))
}

/// Update by id. Publishing keeps an existing publish timestamp; zero matched rows is `NotFound`.
pub async fn update(
    store: &dyn Datastore,
    entry: &ResourceConfig,
    id: &str,
    mut payload: Row,
) -> Result<Value, AppError> {
    if id.is_empty() {
        return Err(AppError::Validation(format!("update on {} requires an id", entry.route)));
    }
    let filters = id_filter(entry, id);
    let now = Utc::now();

    if let Some(column) = publish_timestamp_to_check(&entry.mutations, &payload) {
        let current = store
            .select(&entry.table, &filters, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", entry.route, id)))?;
        if is_blank(current.get(column)) {
            payload.insert(column.to_string(), timestamp(now));
        } else {
            payload.remove(column);
        }
    }
    apply_update_stamps(&entry.mutations, &mut payload, now);

    let row = store
        .update(&entry.table, &filters, payload)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", entry.route, id)))?;
    tracing::info!(table = %entry.table, id, "row updated");
    Ok(Value::Object(row))
}

/// Delete by id. No cascade; a missing row is not an error.
pub async fn delete(store: &dyn Datastore, entry: &ResourceConfig, id: &str) -> Result<(), AppError> {
    if id.is_empty() {
        return Err(AppError::Validation(format!("delete on {} requires an id", entry.route)));
    }
    let deleted = store.delete(&entry.table, &id_filter(entry, id)).await?;
    tracing::info!(table = %entry.table, id, deleted, "rows deleted");
    Ok(())
}
