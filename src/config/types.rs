//! Raw registry config types, deserializable from a JSON registry file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

fn default_id_column() -> String {
    "id".into()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderConfig {
    pub column: String,
    #[serde(default = "default_true")]
    pub ascending: bool,
}

/// Equality constraint applied to list reads unless a caller passes `all` for its column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub column: String,
    pub value: Value,
}

/// Publish flag and timestamp columns of a content table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishRule {
    pub flag_column: String,
    pub timestamp_column: String,
}

/// Field defaults and stamping applied by the mutation pipeline. Defaults only fill absent fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationRules {
    #[serde(default)]
    pub publish: Option<PublishRule>,
    /// Boolean column defaulted to true on create (catalog tables).
    #[serde(default)]
    pub active_column: Option<String>,
    /// Timestamp column stamped with the current time on update.
    #[serde(default)]
    pub touch_column: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlugLookupConfig {
    #[serde(default = "default_slug_column")]
    pub column: String,
    /// Rows are only served when this flag is true.
    pub published_column: String,
}

fn default_slug_column() -> String {
    "slug".into()
}

/// Count-only query behind `<route>/unread-count`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountRule {
    pub column: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub route: String,
    pub table: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default)]
    pub order: Option<OrderConfig>,
    #[serde(default)]
    pub default_filter: Option<FilterConfig>,
    #[serde(default)]
    pub mutations: MutationRules,
    #[serde(default)]
    pub slug_lookup: Option<SlugLookupConfig>,
    #[serde(default)]
    pub unread_count: Option<CountRule>,
}

impl ResourceConfig {
    pub fn new(route: impl Into<String>, table: impl Into<String>) -> Self {
        ResourceConfig {
            route: route.into(),
            table: table.into(),
            id_column: default_id_column(),
            order: None,
            default_filter: None,
            mutations: MutationRules::default(),
            slug_lookup: None,
            unread_count: None,
        }
    }

    pub fn ordered_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(OrderConfig {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn filtered_by(mut self, column: &str, value: Value) -> Self {
        self.default_filter = Some(FilterConfig {
            column: column.into(),
            value,
        });
        self
    }

    /// Catalog table: only active rows are listed, `active_column` defaults to true on create.
    pub fn catalog(self, active_column: &str) -> Self {
        let mut entry = self.filtered_by(active_column, Value::Bool(true));
        entry.mutations.active_column = Some(active_column.into());
        entry
    }

    /// Content table: only published rows are listed and served by slug.
    pub fn content(self, flag_column: &str, timestamp_column: &str) -> Self {
        let mut entry = self.filtered_by(flag_column, Value::Bool(true));
        entry.mutations.publish = Some(PublishRule {
            flag_column: flag_column.into(),
            timestamp_column: timestamp_column.into(),
        });
        entry.slug_lookup = Some(SlugLookupConfig {
            column: default_slug_column(),
            published_column: flag_column.into(),
        });
        entry
    }

    pub fn touching(mut self, column: &str) -> Self {
        self.mutations.touch_column = Some(column.into());
        self
    }

    pub fn counting_unread(mut self, column: &str) -> Self {
        self.unread_count = Some(CountRule {
            column: column.into(),
            value: Value::Bool(false),
        });
        self
    }
}

/// Key/value settings table. Rows are `(key, value, type)`, one row per key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    pub table: String,
    pub key_column: String,
    pub value_column: String,
    #[serde(default)]
    pub type_column: Option<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        SettingsConfig {
            table: "site_settings".into(),
            key_column: "key".into(),
            value_column: "value".into(),
            type_column: Some("type".into()),
        }
    }
}

fn default_param_columns() -> BTreeMap<String, String> {
    [
        ("featured", "is_featured"),
        ("category", "category"),
        ("active", "is_active"),
        ("is_read", "is_read"),
    ]
    .into_iter()
    .map(|(p, c)| (p.to_string(), c.to_string()))
    .collect()
}

/// Everything the gateway needs to know about the site's tables. Built once at start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Query parameter name -> column name. Names not listed are used verbatim.
    #[serde(default = "default_param_columns")]
    pub param_columns: BTreeMap<String, String>,
}

impl RegistryConfig {
    pub fn new(resources: Vec<ResourceConfig>) -> Self {
        RegistryConfig {
            resources,
            settings: SettingsConfig::default(),
            param_columns: default_param_columns(),
        }
    }

    /// Registry of the marketing site: catalog tables, blog posts, leads.
    pub fn site() -> Self {
        Self::new(vec![
            ResourceConfig::new("services", "services")
                .ordered_by("display_order", true)
                .catalog("is_active")
                .touching("updated_at"),
            ResourceConfig::new("portfolio", "portfolio_items")
                .ordered_by("display_order", true)
                .catalog("is_active")
                .touching("updated_at"),
            ResourceConfig::new("pricing", "pricing_plans")
                .ordered_by("display_order", true)
                .catalog("is_active")
                .touching("updated_at"),
            ResourceConfig::new("team", "team_members")
                .ordered_by("display_order", true)
                .catalog("is_active")
                .touching("updated_at"),
            ResourceConfig::new("testimonials", "testimonials")
                .ordered_by("display_order", true)
                .catalog("is_active")
                .touching("updated_at"),
            ResourceConfig::new("faqs", "faqs")
                .ordered_by("display_order", true)
                .catalog("is_active")
                .touching("updated_at"),
            ResourceConfig::new("posts", "blog_posts")
                .ordered_by("published_at", false)
                .content("is_published", "published_at")
                .touching("updated_at"),
            ResourceConfig::new("leads", "leads")
                .ordered_by("created_at", false)
                .counting_unread("is_read"),
        ])
    }
}
