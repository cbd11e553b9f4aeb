use std::str::FromStr;
use thiserror::Error;

use crate::listing::{FilterMode, DEFAULT_MAX_LIMIT};

pub const DEFAULT_PORT: &str = "4000";

pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "https://clutch-chronicles.vercel.app",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub app_env: String,
    pub api_bind: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub cors_origins: Vec<String>,
    pub listing_filter_mode: FilterMode,
    pub listing_max_limit: i64,
    pub identity_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .or_else(|| get("CONNECTION_STRING"))
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let supabase_url = get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let supabase_anon_key =
            get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        let app_env = get("APP_ENV").unwrap_or_else(|| "development".to_string());
        let api_bind = get("API_BIND").unwrap_or_else(|| {
            format!(
                "0.0.0.0:{}",
                get("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string())
            )
        });
        let database_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?;
        let run_migrations = parse_or(&get, "RUN_MIGRATIONS", false)?;
        let cors_origins = match get("CORS_ORIGINS") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };
        let listing_filter_mode = parse_or(&get, "LISTING_FILTER_MODE", FilterMode::default())?;
        let listing_max_limit: i64 = parse_or(&get, "LISTING_MAX_LIMIT", DEFAULT_MAX_LIMIT)?;
        if listing_max_limit < 1 {
            return Err(ConfigError::Invalid {
                key: "LISTING_MAX_LIMIT",
                value: listing_max_limit.to_string(),
            });
        }
        let identity_timeout_secs = parse_or(&get, "IDENTITY_TIMEOUT_SECS", 10)?;

        Ok(Self {
            database_url,
            supabase_url,
            supabase_anon_key,
            app_env,
            api_bind,
            database_max_connections,
            run_migrations,
            cors_origins,
            listing_filter_mode,
            listing_max_limit,
            identity_timeout_secs,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
