//! Application configuration
//!
//! Split into focused sub-modules:
//! - `database`: SQLite store settings
//! - `cache`: retention and admin-surface defaults
//!
//! Provider selection lives in `ai_core::ProviderConfig` and is embedded
//! here as the `provider` section.

mod cache;
mod database;

use ai_core::ProviderConfig;
use serde::{Deserialize, Serialize};

pub use cache::CacheConfig;
pub use database::DatabaseConfig;

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding provider selection and settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Cache retention and admin defaults
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    ///
    /// Precedence, lowest to highest: built-in defaults, `config.toml`
    /// next to the working directory, then `EMBEDCACHE_*` environment
    /// variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Some("config"))
    }

    /// Load configuration from a specific file basename (no extension)
    pub fn load_from(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(name) = file {
            builder = builder.add_source(config::File::with_name(name).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("EMBEDCACHE")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
