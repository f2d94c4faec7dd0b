// src/db/mod.rs

use sqlx::{Pool, Postgres};

use crate::config::PostgresConfig;

pub async fn connect(cfg: &PostgresConfig) -> anyhow::Result<Pool<Postgres>> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect(&cfg.url)
        .await?;

    tracing::info!(max_connections = cfg.max_connections, "connected to PostgreSQL");
    Ok(pool)
}
