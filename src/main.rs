// src/main.rs

use insightedge_api::{
    app,
    config::{self, Config, StoreConfig},
    db,
    store::{PgStore, RestStore},
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    let cfg = Config::from_env()?;

    let state = match &cfg.store {
        StoreConfig::Postgres(pg) => AppState::new(PgStore::new(db::connect(pg).await?)),
        StoreConfig::Rest(rest) => {
            tracing::info!(url = %rest.url, "using REST query API");
            AppState::new(RestStore::new(rest)?)
        }
    };

    let addr = cfg.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, store = state.store.backend(), "API listening");

    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}
