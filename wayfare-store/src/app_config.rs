use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub supplier: SupplierConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Inventory vendor credentials. Never compiled in; supplied per environment.
#[derive(Debug, Deserialize, Clone)]
pub struct SupplierConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    30 * 60
}

fn default_max_pages() -> usize {
    50
}

fn default_sweep_interval_seconds() -> u64 {
    5 * 60
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            max_pages: default_max_pages(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl CatalogConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in; holds real supplier keys on developer machines.
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. WAYFARE__SUPPLIER__API_KEY=...
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.supplier.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message("supplier.api_key is not set".into()));
        }
        if !self.supplier.base_url.starts_with("http") {
            return Err(config::ConfigError::Message(
                "supplier.base_url must be an http(s) URL".into(),
            ));
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret must be at least 16 characters".into(),
            ));
        }
        Ok(())
    }
}
