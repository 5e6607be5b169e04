//! Index transport configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the search cluster
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum retry attempts
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Initial retry delay in milliseconds (exponential backoff)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound for a single backoff sleep
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pool idle timeout in milliseconds
    #[serde(default = "default_pool_idle_timeout_ms")]
    pub pool_idle_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            username: None,
            password: None,
            user_agent: default_user_agent(),
            pool_idle_timeout_ms: default_pool_idle_timeout_ms(),
        }
    }
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Interactive autocomplete budget (1s timeout, no retries)
    pub fn interactive(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: 1_000,
            connect_timeout_ms: 500,
            retry_count: 0,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_retry(mut self, count: u32, initial_delay: Duration) -> Self {
        self.retry_count = count;
        self.retry_delay_ms = initial_delay.as_millis() as u64;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_idle_timeout_ms)
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_max_retry_delay_ms() -> u64 {
    2_000
}

fn default_user_agent() -> String {
    format!("aperture/{}", env!("CARGO_PKG_VERSION"))
}

fn default_pool_idle_timeout_ms() -> u64 {
    90_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.base_url, "http://localhost:9200");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_count, 2);
    }

    #[test]
    fn test_interactive_config() {
        let config = TransportConfig::interactive("http://es:9200");
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.retry_count, 0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TransportConfig::new("http://es:9200")
            .with_timeout(Duration::from_secs(3))
            .with_retry(4, Duration::from_millis(50))
            .with_credentials("elastic", "changeme");

        assert_eq!(config.timeout_ms, 3_000);
        assert_eq!(config.retry_count, 4);
        assert_eq!(config.retry_delay(), Duration::from_millis(50));
        assert_eq!(config.username.as_deref(), Some("elastic"));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: TransportConfig =
            serde_json::from_str(r#"{ "base_url": "http://search:9200", "retry_count": 0 }"#)
                .unwrap();
        assert_eq!(config.base_url, "http://search:9200");
        assert_eq!(config.retry_count, 0);
        assert_eq!(config.timeout_ms, 5_000);
    }
}
