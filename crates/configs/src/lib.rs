//! Layered configuration for the Ideaboard binary.
//!
//! Values come from an optional `ideaboard.toml` and from `IDEABOARD_*`
//! environment variables, the environment winning. Library crates never
//! read configuration themselves; the binary loads it and passes values
//! down.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listing cap handed to idea queries.
    pub list_limit: usize,
    /// Tracing filter directive, e.g. "info" or "ideaboard=debug".
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            list_limit: ib_core::models::DEFAULT_LIST_LIMIT,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `.env`, then the optional config file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("ideaboard").required(false))
            .add_source(config::Environment::with_prefix("IDEABOARD").try_parsing(true))
            .build()?;
        let cfg: AppConfig = settings.try_deserialize()?;
        tracing::debug!(?cfg, "configuration loaded");
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_core_listing_cap() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.list_limit, ib_core::models::DEFAULT_LIST_LIMIT);
        assert_eq!(cfg.log_filter, "info");
    }
}
