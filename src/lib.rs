//! Site gateway: maps a REST path vocabulary onto a table datastore, with
//! settings key/value storage and signed asset uploads.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod upload;

pub use config::{load_registry, GatewaySettings, RegistryConfig, ResourceRegistry};
pub use endpoint::{parse_endpoint, EndpointDescriptor, EndpointKind, Verb};
pub use error::{AppError, ConfigError, DatastoreError};
pub use routes::{api_routes, common_routes, common_routes_with_ready};
pub use service::{Dispatcher, Outcome, Payload};
pub use state::AppState;
pub use store::{Datastore, MemoryStore, PgStore};
pub use upload::{AssetHost, HttpAssetHost, StoredAsset, UploadFile};
