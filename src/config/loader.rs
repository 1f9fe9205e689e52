//! Load the registry from a JSON file, or fall back to the built-in site registry.

use crate::config::{RegistryConfig, ResourceRegistry};
use crate::error::ConfigError;
use std::path::Path;

/// Parse a registry document. Same shape as `RegistryConfig`'s serde form.
pub fn parse_registry(json: &str) -> Result<RegistryConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_registry_file(path: &Path) -> Result<RegistryConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_registry(&raw)
}

/// Build the registry: from `path` when given, otherwise the built-in site registry.
pub async fn load_registry(path: Option<&Path>) -> Result<ResourceRegistry, ConfigError> {
    let config = match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading resource registry");
            load_registry_file(p).await?
        }
        None => RegistryConfig::site(),
    };
    let registry = ResourceRegistry::new(config)?;
    tracing::debug!(resources = registry.entries().len(), "resource registry ready");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_document_fills_defaults() {
        let config = parse_registry(
            r#"{
                "resources": [
                    {
                        "route": "events",
                        "table": "events",
                        "order": { "column": "starts_at" },
                        "default_filter": { "column": "is_public", "value": true }
                    }
                ]
            }"#,
        )
        .unwrap();
        let entry = &config.resources[0];
        assert_eq!(entry.id_column, "id");
        assert!(entry.order.as_ref().unwrap().ascending);
        assert_eq!(entry.default_filter.as_ref().unwrap().value, json!(true));
        assert_eq!(config.settings.table, "site_settings");
        assert_eq!(config.param_columns.get("featured").map(String::as_str), Some("is_featured"));
    }

    #[test]
    fn malformed_document_is_a_load_error() {
        assert!(matches!(parse_registry("{\"resources\": 3}"), Err(ConfigError::Load(_))));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let err = load_registry(Some(Path::new("/nonexistent/registry.json"))).await.unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[tokio::test]
    async fn no_path_uses_site_registry() {
        let registry = load_registry(None).await.unwrap();
        assert!(registry.entry("testimonials").is_some());
    }
}
