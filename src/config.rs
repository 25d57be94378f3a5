use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::events::DEFAULT_PRODUCT_TOPIC;
use crate::logic::DEFAULT_ORDER_TOPIC;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub database: DatabaseConfig,
    pub events: EventsConfig,
}

/// Gateway bind address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend bind address
    pub host: String,
    pub port: u16,
    /// Base URL the gateway uses to reach the backend
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,
    pub max_connections: Option<u32>,
    /// Load demo records into the in-memory store
    pub seed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// HTTP event bus endpoint; events are only logged when unset
    pub endpoint: Option<String>,
    pub order_topic: String,
    /// Topic for batch product-update messages
    pub product_topic: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50052,
            url: None,
            timeout_secs: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            max_connections: Some(20),
            seed: true,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            order_topic: DEFAULT_ORDER_TOPIC.to_string(),
            product_topic: DEFAULT_PRODUCT_TOPIC.to_string(),
            timeout_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Add environment variables, e.g. FIELDMASK_BACKEND__URL
        config = config.add_source(
            config::Environment::with_prefix("FIELDMASK")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the database URL from config or environment, if any
    pub fn database_url(&self) -> Option<String> {
        if let Some(connection_string) = &self.database.connection_string {
            return Some(connection_string.clone());
        }

        std::env::var("DATABASE_URL").ok()
    }

    /// Get the gateway bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get the backend bind address
    pub fn backend_address(&self) -> String {
        format!("{}:{}", self.backend.host, self.backend.port)
    }

    /// Base URL of the backend as seen from the gateway
    pub fn backend_url(&self) -> String {
        self.backend
            .url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.backend_address()))
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn events_timeout(&self) -> Duration {
        Duration::from_secs(self.events.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3001");
        assert_eq!(config.backend_url(), "http://127.0.0.1:50052");
        assert_eq!(config.events.order_topic, "order.created");
        assert_eq!(config.events.product_topic, "product-updates");
        assert_eq!(config.backend_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_explicit_backend_url_wins() {
        let mut config = AppConfig::default();
        config.backend.url = Some("http://grpc-product-service:50052".to_string());
        assert_eq!(config.backend_url(), "http://grpc-product-service:50052");
    }
}
