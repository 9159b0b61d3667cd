//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use domain::catalog::DEFAULT_PAGE_SIZE;
use domain::{CredentialParseError, CredentialSet, WorkflowSettings};
use sheet_store::RawInventoryRow;
use thiserror::Error;

/// Errors in the environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ORDER_DESK_CREDENTIALS: {0}")]
    Credentials(#[from] CredentialParseError),

    #[error("ORDER_DESK_PAGE_SIZE must be a positive integer, got {0:?}")]
    PageSize(String),

    #[error("could not read inventory seed {path}: {source}")]
    SeedRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse inventory seed {path}: {source}")]
    SeedParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `ORDER_DESK_PAGE_SIZE`: catalog page size (default: `10`)
/// - `ORDER_DESK_CREDENTIALS`: `login:secret` pairs, comma-separated
/// - `DATABASE_URL`: Postgres sheets when set, in-memory otherwise
/// - `ORDER_DESK_INVENTORY_SEED`: JSON rows loaded into in-memory inventory
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub page_size: usize,
    pub credentials: CredentialSet,
    pub database_url: Option<String>,
    pub inventory_seed: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let page_size = match lookup("ORDER_DESK_PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::PageSize(raw)),
            },
            None => defaults.page_size,
        };

        let credentials = match lookup("ORDER_DESK_CREDENTIALS") {
            Some(raw) => CredentialSet::parse(&raw)?,
            None => defaults.credentials,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            page_size,
            credentials,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            inventory_seed: lookup("ORDER_DESK_INVENTORY_SEED").map(PathBuf::from),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Workflow settings derived from this configuration.
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            page_size: self.page_size,
        }
    }

    /// Reads the inventory seed file, if one is configured.
    pub fn load_inventory_seed(&self) -> Result<Vec<RawInventoryRow>, ConfigError> {
        let Some(path) = &self.inventory_seed else {
            return Ok(Vec::new());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedRead {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::SeedParse {
            path: path.clone(),
            source,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            credentials: CredentialSet::new(),
            database_url: None,
            inventory_seed: None,
        }
    }
}
