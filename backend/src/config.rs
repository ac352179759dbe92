//! Configuration management for the Marbo Shop backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with SHOP_ prefix
//!
//! The config is built once at startup and injected by reference through
//! the application state; nothing reads the environment at request time.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// API-key boundary for mutating endpoints
    pub api: ApiConfig,

    /// External spreadsheet mirror configuration
    pub sheets: SheetsConfig,

    /// Webhook automation endpoint configuration
    pub webhook: WebhookConfig,

    /// Inventory behavior configuration
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Static API key required on mutating endpoints
    pub key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    /// Base URL of the spreadsheet service API
    pub base_url: String,

    /// Bearer token for the spreadsheet service
    pub api_token: String,

    /// Target spreadsheet identifier
    pub spreadsheet_id: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl SheetsConfig {
    /// Credentials and target must be present before any network call;
    /// a missing value counts as a failed sync attempt
    pub fn validate(&self) -> Result<(), String> {
        if self.api_token.trim().is_empty() {
            return Err("sheets.api_token is not configured".to_string());
        }
        if self.spreadsheet_id.trim().is_empty() {
            return Err("sheets.spreadsheet_id is not configured".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Webhook consumer URL; sync is silently skipped when unset
    pub url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Stock level at or below which a low-stock notification is raised
    pub low_stock_threshold: i32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("SHOP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("api.key", "")?
            .set_default("sheets.base_url", "https://sheets.googleapis.com")?
            .set_default("sheets.api_token", "")?
            .set_default("sheets.spreadsheet_id", "")?
            .set_default("sheets.timeout_secs", 10)?
            .set_default("webhook.timeout_secs", 10)?
            .set_default("inventory.low_stock_threshold", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SHOP_ prefix)
            .add_source(
                Environment::with_prefix("SHOP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheets(token: &str, spreadsheet: &str) -> SheetsConfig {
        SheetsConfig {
            base_url: "https://sheets.googleapis.com".to_string(),
            api_token: token.to_string(),
            spreadsheet_id: spreadsheet.to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn sheets_config_requires_token_and_target() {
        assert!(sheets("", "sheet-1").validate().is_err());
        assert!(sheets("token", "").validate().is_err());
        assert!(sheets("token", "sheet-1").validate().is_ok());
    }
}
