//! Registry validation: routes are well-formed, unique and do not collide with special paths.

use crate::config::RegistryConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

/// Top-level paths handled before the registry is consulted.
pub const RESERVED_ROUTES: &[&str] = &["upload", "settings"];

/// Path segments that introduce special endpoints under a resource.
pub const RESERVED_SEGMENTS: &[&str] = &["by-slug", "unread-count"];

/// Strip leading and trailing slashes.
pub fn normalize_route(route: &str) -> &str {
    route.trim_matches('/')
}

pub fn validate(config: &RegistryConfig) -> Result<(), ConfigError> {
    let mut routes = HashSet::new();
    for entry in &config.resources {
        let route = normalize_route(&entry.route);
        if route.is_empty() {
            return Err(ConfigError::InvalidRoute {
                route: entry.route.clone(),
                reason: "route is empty",
            });
        }
        if route.contains(['?', '#']) || route.split('/').any(str::is_empty) {
            return Err(ConfigError::InvalidRoute {
                route: entry.route.clone(),
                reason: "route must be slash-separated path segments",
            });
        }
        if RESERVED_ROUTES.contains(&route) {
            return Err(ConfigError::InvalidRoute {
                route: entry.route.clone(),
                reason: "route is reserved",
            });
        }
        if route.split('/').any(|s| RESERVED_SEGMENTS.contains(&s)) {
            return Err(ConfigError::InvalidRoute {
                route: entry.route.clone(),
                reason: "route contains a reserved segment",
            });
        }
        if entry.table.trim().is_empty() {
            return Err(ConfigError::Validation(format!("route {} has no table", route)));
        }
        if !routes.insert(route) {
            return Err(ConfigError::DuplicateRoute(route.to_string()));
        }
    }

    let settings = &config.settings;
    if settings.table.trim().is_empty() || settings.key_column.trim().is_empty() {
        return Err(ConfigError::Validation("settings table and key column are required".into()));
    }
    Ok(())
}
