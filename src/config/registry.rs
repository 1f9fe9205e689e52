//! Resolved resource registry: validated config with routes indexed for longest-prefix matching.

use crate::config::{normalize_route, validate, RegistryConfig, ResourceConfig, SettingsConfig};
use crate::error::ConfigError;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
pub struct ResourceRegistry {
    /// Sorted by route length, longest first.
    entries: Vec<ResourceConfig>,
    by_route: HashMap<String, usize>,
    settings: SettingsConfig,
    param_columns: BTreeMap<String, String>,
}

impl ResourceRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, ConfigError> {
        validate(&config)?;
        let mut entries: Vec<ResourceConfig> = config
            .resources
            .into_iter()
            .map(|mut e| {
                e.route = normalize_route(&e.route).to_string();
                e
            })
            .collect();
        entries.sort_by(|a, b| b.route.len().cmp(&a.route.len()).then_with(|| a.route.cmp(&b.route)));
        let by_route = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.route.clone(), i))
            .collect();
        Ok(ResourceRegistry {
            entries,
            by_route,
            settings: config.settings,
            param_columns: config.param_columns,
        })
    }

    /// Registry of the marketing site.
    pub fn site() -> Result<Self, ConfigError> {
        Self::new(RegistryConfig::site())
    }

    pub fn entry(&self, route: &str) -> Option<&ResourceConfig> {
        self.by_route
            .get(normalize_route(route))
            .and_then(|&i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[ResourceConfig] {
        &self.entries
    }

    pub fn settings(&self) -> &SettingsConfig {
        &self.settings
    }

    /// Column a query parameter filters on. Unmapped names are columns already.
    pub fn column_for_param<'a>(&'a self, param: &'a str) -> &'a str {
        self.param_columns.get(param).map(String::as_str).unwrap_or(param)
    }

    /// Longest registered route equal to `path` or followed by `/rest`.
    /// Returns the entry and `rest` (None for an exact match).
    pub fn match_path<'p>(&self, path: &'p str) -> Option<(&ResourceConfig, Option<&'p str>)> {
        let path = normalize_route(path);
        self.entries.iter().find_map(|entry| {
            if path == entry.route {
                return Some((entry, None));
            }
            path.strip_prefix(entry.route.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty())
                .map(|rest| (entry, Some(rest)))
        })
    }
}
