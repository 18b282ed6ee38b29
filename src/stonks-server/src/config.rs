//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which quote backend answers lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MarketBackendKind {
    /// Yahoo Finance quote endpoint.
    #[default]
    Yahoo,
    /// Canned quotes, no network access.
    Fake,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Per-delivery bound on backend and Slack calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Quote backend.
    #[serde(default)]
    pub market_backend: MarketBackendKind,

    /// Accept deliveries without a signing secret configured.
    #[serde(default)]
    pub allow_unsigned: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_shutdown_timeout() -> u64 {
    15
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout: default_request_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            max_body_size: default_max_body_size(),
            market_backend: MarketBackendKind::default(),
            allow_unsigned: false,
        }
    }
}

impl ServerConfig {
    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Shutdown timeout as a duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Check values that would otherwise fail later at runtime.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout == 0 {
            anyhow::bail!("request timeout must be at least one second");
        }
        if self.max_body_size == 0 {
            anyhow::bail!("max body size must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(15));
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.market_backend, MarketBackendKind::Yahoo);
        assert!(!config.allow_unsigned);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = ServerConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_body_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_kind_serde() {
        let kind: MarketBackendKind = serde_json::from_str(r#""fake""#).unwrap();
        assert_eq!(kind, MarketBackendKind::Fake);
    }
}
