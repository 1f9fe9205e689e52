//! Site gateway server.
//!
//! Run from repo root: `cargo run -p site-server`

use site_gateway::{
    api_routes, common_routes_with_ready, load_registry, AppState, Datastore, Dispatcher, GatewaySettings,
    HttpAssetHost, MemoryStore, PgStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("site_gateway=info")),
        )
        .init();

    let settings = GatewaySettings::from_env()?;
    let registry = load_registry(settings.registry_path.as_deref()).await?;

    let store: Arc<dyn Datastore> = match &settings.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let mut dispatcher = Dispatcher::new(registry, store);
    match settings.asset_host.clone() {
        Some(config) => dispatcher = dispatcher.with_asset_host(Arc::new(HttpAssetHost::new(config)?)),
        None => tracing::info!("asset host not configured, uploads disabled"),
    }
    let state = AppState::new(dispatcher);

    let app = common_routes_with_ready(state.clone()).nest("/api", api_routes(state, settings.upload_max_bytes));
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("site gateway listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
