//! Application settings read from the environment.
//!
//! Every setting has a default so the server starts with an empty environment.
//! Values are usually supplied through a `.env` file loaded by `dotenvy` in `main`.

use crate::{
    config::database::DEFAULT_DATABASE_URL,
    errors::{Error, Result},
};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::info;

/// Default number of rows per page when the request carries no `limit`.
pub const DEFAULT_PAGE_SIZE: u64 = 6;

/// Runtime settings shared by the HTTP layer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SeaORM connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Socket address the server binds to (`BIND_ADDRESS`)
    pub bind_address: String,
    /// Default page size for paginated listings (`PAGE_SIZE`)
    pub page_size: u64,
    /// Optional TOML file with tags and ingredients to seed (`SEED_FILE`)
    pub seed_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: "0.0.0.0:8000".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            seed_file: None,
        }
    }
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let page_size = try_load("PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            return Err(Error::Config {
                message: "PAGE_SIZE must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", defaults.database_url)?,
            bind_address: try_load("BIND_ADDRESS", defaults.bind_address)?,
            page_size,
            seed_file: env::var("SEED_FILE").ok().map(PathBuf::from),
        })
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| Error::Config {
            message: format!("Invalid {key} value '{raw}': {e}"),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn test_try_load_falls_back_to_default() {
        let value: u64 = try_load("FOODGRAM_TEST_UNSET_VARIABLE", 42).unwrap_or_default();
        assert_eq!(value, 42);
    }
}
