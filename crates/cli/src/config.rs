//! Environment-backed configuration.
//!
//! All values are read once at startup; a command fails immediately when a
//! variable it needs is missing, instead of partway through a run.

use thiserror::Error;

use reclass_classifier::HttpCapabilityConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-5";

#[derive(Debug, Clone)]
pub struct Config {
    database_url: Option<String>,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            api_key: std::env::var("CLASSIFIER_API_KEY").ok(),
            base_url: std::env::var("CLASSIFIER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("CLASSIFIER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn capability(&self) -> Result<HttpCapabilityConfig, ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("CLASSIFIER_API_KEY"))?;
        Ok(HttpCapabilityConfig::new(
            self.base_url.clone(),
            api_key,
            self.model.clone(),
        ))
    }
}
