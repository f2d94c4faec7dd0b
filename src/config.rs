// src/config.rs

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context};

pub const DEFAULT_LOG_FILTER: &str = "insightedge_api=info,tower_http=info";

#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestConfig {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

/// Which backend the service talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Postgres(PostgresConfig),
    Rest(RestConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `DATABASE_URL` wins over `SUPABASE_URL`; one of the two is required.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = if let Some(url) = get("DATABASE_URL") {
            StoreConfig::Postgres(PostgresConfig {
                url,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            })
        } else if let Some(url) = get("SUPABASE_URL") {
            let api_key = get("SUPABASE_ANON_KEY")
                .ok_or_else(|| anyhow!("SUPABASE_ANON_KEY must be set when SUPABASE_URL is"))?;
            StoreConfig::Rest(RestConfig {
                url,
                api_key,
                timeout_secs: parse_or(&get, "STORE_TIMEOUT_SECS", 30)?,
            })
        } else {
            return Err(anyhow!("set DATABASE_URL or SUPABASE_URL (with SUPABASE_ANON_KEY)"));
        };

        Ok(Config {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "PORT", 8080)?,
            store,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v.trim().parse().with_context(|| format!("invalid {key}: {v:?}")),
        None => Ok(default),
    }
}
