use std::env;

use thiserror::Error;

pub const DEFAULT_DATABASE: &str = "RoomSplit";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("You need to add the {0} to the env")]
    Missing(&'static str),
}

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub bind_address: String,
    /// Allowed browser origin; any origin is allowed when unset.
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Ok(Self {
            mongodb_uri: value("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
            database: value("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            bind_address: value("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            cors_origin: value("CORS_ORIGIN"),
        })
    }
}
