//! Configuration management for the events Lambda.

use std::env;
use std::str::FromStr;

use crate::Error;

/// Which event store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(Error::Config(format!(
                "EVENTS_STORE must be dynamodb or memory, got {}",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table holding the events
    pub table_name: String,
    /// Store implementation to use
    pub store_backend: StoreBackend,
    /// Endpoint override, e.g. DynamoDB Local
    pub dynamodb_endpoint: Option<String>,
    /// API Gateway stage prefix stripped from request paths
    pub stage_prefix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "EventsTable".to_string(),
            store_backend: StoreBackend::DynamoDb,
            dynamodb_endpoint: None,
            stage_prefix: Some("/prod".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();

        let store_backend = match lookup("EVENTS_STORE") {
            Some(value) => value.parse()?,
            None => defaults.store_backend,
        };

        let stage_prefix = match lookup("API_STAGE_PREFIX") {
            Some(prefix) => normalize_prefix(&prefix),
            None => defaults.stage_prefix,
        };

        Ok(Self {
            table_name: lookup("EVENTS_TABLE_NAME").unwrap_or(defaults.table_name),
            store_backend,
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|e| !e.is_empty()),
            stage_prefix,
        })
    }
}

fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}
