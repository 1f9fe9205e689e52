//! Dispatcher: parses the endpoint and routes `(verb, kind)` to its handler.

use crate::config::{ResourceConfig, ResourceRegistry};
use crate::endpoint::{parse_endpoint, EndpointDescriptor, EndpointKind, Verb};
use crate::error::AppError;
use crate::service::{mutation, query, settings};
use crate::store::{Datastore, FilterSet, Row};
use crate::upload::{AssetHost, StoredAsset, UploadFile};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Request body as received by the transport.
#[derive(Clone, Debug)]
pub enum Payload {
    Empty,
    Json(Value),
    File(UploadFile),
}

/// Normalized result of a dispatched request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Rows(Vec<Value>),
    Row(Value),
    Created(Value),
    Count(u64),
    Settings(Map<String, Value>),
    Asset(StoredAsset),
    NoContent,
}

pub struct Dispatcher {
    registry: Arc<ResourceRegistry>,
    store: Arc<dyn Datastore>,
    assets: Option<Arc<dyn AssetHost>>,
}

fn path_only(target: &str) -> &str {
    target.split_once('?').map(|(p, _)| p).unwrap_or(target)
}

fn json_object(payload: Payload) -> Result<Row, AppError> {
    match payload {
        Payload::Json(Value::Object(m)) => Ok(m),
        Payload::Json(_) => Err(AppError::Validation("body must be a JSON object".into())),
        Payload::Empty => Err(AppError::Validation("body is required".into())),
        Payload::File(_) => Err(AppError::Validation("expected a JSON body, got a file".into())),
    }
}

impl Dispatcher {
    pub fn new(registry: ResourceRegistry, store: Arc<dyn Datastore>) -> Self {
        Dispatcher {
            registry: Arc::new(registry),
            store,
            assets: None,
        }
    }

    pub fn with_asset_host(mut self, assets: Arc<dyn AssetHost>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn Datastore {
        self.store.as_ref()
    }

    pub fn describe(&self, target: &str) -> EndpointDescriptor {
        parse_endpoint(target, &self.registry)
    }

    /// Handle one request: `target` is the path with optional query string.
    pub async fn dispatch(&self, verb: Verb, target: &str, payload: Payload) -> Result<Outcome, AppError> {
        let EndpointDescriptor { resource, kind, params } = self.describe(target);
        tracing::debug!(%verb, endpoint = target, kind = ?kind, resource = ?resource, "dispatch");
        let path = path_only(target);
        let not_allowed = || AppError::MethodNotAllowed {
            verb: verb.to_string(),
            path: path.to_string(),
        };

        let resource = resource.as_deref();
        match kind {
            EndpointKind::Unknown => Err(AppError::Parse(path.to_string())),
            EndpointKind::List => {
                let entry = self.entry(resource)?;
                match verb {
                    Verb::Get => {
                        let rows = query::list(self.store(), &self.registry, entry, &params).await?;
                        Ok(Outcome::Rows(rows))
                    }
                    Verb::Post => {
                        let row = mutation::create(self.store(), entry, json_object(payload)?).await?;
                        Ok(Outcome::Created(row))
                    }
                    Verb::Put | Verb::Patch | Verb::Delete => Err(AppError::Validation(format!(
                        "{} {} requires an id",
                        verb, path
                    ))),
                }
            }
            EndpointKind::Single { id } => {
                let entry = self.entry(resource)?;
                match verb {
                    Verb::Get => self.read(entry, &id).await.map(Outcome::Row),
                    Verb::Put | Verb::Patch => {
                        let row = mutation::update(self.store(), entry, &id, json_object(payload)?).await?;
                        Ok(Outcome::Row(row))
                    }
                    Verb::Delete => {
                        mutation::delete(self.store(), entry, &id).await?;
                        Ok(Outcome::NoContent)
                    }
                    Verb::Post => Err(not_allowed()),
                }
            }
            EndpointKind::BySlug { slug } => match verb {
                Verb::Get => {
                    let entry = self.entry(resource)?;
                    self.by_slug(entry, &slug, path).await.map(Outcome::Row)
                }
                _ => Err(not_allowed()),
            },
            EndpointKind::Count => match verb {
                Verb::Get => {
                    let entry = self.entry(resource)?;
                    self.unread_count(entry, path).await.map(Outcome::Count)
                }
                _ => Err(not_allowed()),
            },
            EndpointKind::Settings => {
                let cfg = self.registry.settings();
                match verb {
                    Verb::Get => settings::get_settings(self.store(), cfg).await.map(Outcome::Settings),
                    Verb::Post | Verb::Put => {
                        let values = json_object(payload)?;
                        settings::set_settings(self.store(), cfg, values).await.map(Outcome::Settings)
                    }
                    Verb::Patch | Verb::Delete => Err(not_allowed()),
                }
            }
            EndpointKind::Upload => match (verb, payload) {
                (Verb::Post, Payload::File(file)) => self.upload(file).await.map(Outcome::Asset),
                (Verb::Post, _) => Err(AppError::Validation("upload requires a multipart 'file' field".into())),
                _ => Err(not_allowed()),
            },
        }
    }

    fn entry(&self, resource: Option<&str>) -> Result<&ResourceConfig, AppError> {
        resource
            .and_then(|route| self.registry.entry(route))
            .ok_or_else(|| AppError::Validation("no table resolved for request".into()))
    }

    async fn read(&self, entry: &ResourceConfig, id: &str) -> Result<Value, AppError> {
        let filters = FilterSet::eq(entry.id_column.clone(), id);
        self.store
            .select(&entry.table, &filters, None)
            .await?
            .into_iter()
            .next()
            .map(Value::Object)
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", entry.route, id)))
    }

    async fn by_slug(&self, entry: &ResourceConfig, slug: &str, path: &str) -> Result<Value, AppError> {
        let lookup = entry
            .slug_lookup
            .as_ref()
            .ok_or_else(|| AppError::Parse(path.to_string()))?;
        let filters = FilterSet::eq(lookup.column.clone(), slug).and(lookup.published_column.clone(), true);
        self.store
            .select(&entry.table, &filters, None)
            .await?
            .into_iter()
            .next()
            .map(Value::Object)
            .ok_or_else(|| AppError::NotFound(format!("{} with slug '{}'", entry.route, slug)))
    }

    async fn unread_count(&self, entry: &ResourceConfig, path: &str) -> Result<u64, AppError> {
        let rule = entry
            .unread_count
            .as_ref()
            .ok_or_else(|| AppError::Parse(path.to_string()))?;
        let filters = FilterSet::eq(rule.column.clone(), rule.value.clone());
        Ok(self.store.count(&entry.table, &filters).await?)
    }

    async fn upload(&self, file: UploadFile) -> Result<StoredAsset, AppError> {
        let assets = self
            .assets
            .as_ref()
            .ok_or_else(|| AppError::Upload("asset host is not configured".into()))?;
        let asset = assets.upload(file).await?;
        tracing::info!(path = %asset.path, "asset uploaded");
        Ok(asset)
    }
}
