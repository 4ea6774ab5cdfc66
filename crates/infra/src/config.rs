//! Runtime configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use thiserror::Error;

use nova_core::DEFAULT_PAGE_SIZE;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server bind address (host:port).
    pub bind_address: String,

    /// Postgres URL; in-memory stores are used when absent.
    pub database_url: Option<String>,

    pub max_db_connections: u32,

    /// Filesystem root for uploads; blobs stay in memory when absent.
    pub storage_path: Option<String>,

    /// Prefix of public download and logo URLs.
    pub public_base_url: String,

    pub jwt_secret: String,

    pub jwt_ttl_secs: i64,

    pub page_size: u32,

    pub root_username: String,

    pub root_password: String,

    /// bcrypt cost override.
    pub bcrypt_cost: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_address = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into());
        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", bind_address.replace("0.0.0.0", "localhost")));

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let root_password = var("ROOT_PASSWORD").unwrap_or_else(|| {
            tracing::warn!("ROOT_PASSWORD not set; using insecure dev default");
            "admin".to_string()
        });

        Ok(Self {
            database_url: var("DATABASE_URL"),
            max_db_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(10),
            storage_path: var("STORAGE_PATH"),
            public_base_url,
            jwt_secret,
            jwt_ttl_secs: parse(&var, "JWT_TTL_SECS")?.unwrap_or(7 * 24 * 3600),
            page_size: parse(&var, "PAGE_SIZE")?.unwrap_or(DEFAULT_PAGE_SIZE),
            root_username: var("ROOT_USERNAME").unwrap_or_else(|| "admin".into()),
            root_password,
            bcrypt_cost: parse(&var, "BCRYPT_COST")?,
            bind_address,
        })
    }

    /// In-memory everything; used by tests and local runs.
    pub fn ephemeral(bind_address: impl Into<String>) -> Self {
        let bind_address = bind_address.into();
        Self {
            public_base_url: format!("http://{bind_address}"),
            bind_address,
            database_url: None,
            max_db_connections: 10,
            storage_path: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_secs: 3600,
            page_size: DEFAULT_PAGE_SIZE,
            root_username: "admin".into(),
            root_password: "admin".into(),
            bcrypt_cost: Some(4),
        }
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match var(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_in_memory_dev_setup() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert_eq!(config.database_url, None);
        assert_eq!(config.storage_path, None);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://nova@db/nova"),
            ("PAGE_SIZE", "25"),
            ("JWT_TTL_SECS", "60"),
            ("PUBLIC_BASE_URL", "https://cdn.example.com"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://nova@db/nova"));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.jwt_ttl_secs, 60);
        assert_eq!(config.public_base_url, "https://cdn.example.com");
    }

    #[test]
    fn rejects_unparsable_numbers() {
        let err = config(&[("PAGE_SIZE", "ten")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PAGE_SIZE",
                value: "ten".into()
            }
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(config.database_url, None);
    }
}
