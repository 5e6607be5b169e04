//! JSON transport to the search cluster

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    config::TransportConfig,
    error::{Result, TransportError},
    middleware::{RetryConfig, RetryMiddleware},
};

const NDJSON: &str = "application/x-ndjson";

/// Mockable index transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body, returning the JSON response
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value>;

    /// POST newline-delimited JSON (bulk / multi-search)
    async fn post_ndjson(&self, path: &str, lines: &[Value]) -> Result<Value>;
}

/// Production transport over reqwest
pub struct HttpTransport {
    inner: reqwest::Client,
    base_url: Url,
    config: TransportConfig,
    retry: RetryMiddleware,
}

impl HttpTransport {
    /// Create a new transport with configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let inner = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .pool_idle_timeout(config.pool_idle_timeout())
            .build()
            .map_err(|e| TransportError::BuildError(e.to_string()))?;

        let retry = RetryMiddleware::new(RetryConfig {
            max_retries: config.retry_count,
            initial_delay: config.retry_delay(),
            max_delay: config.max_retry_delay(),
            ..Default::default()
        });

        Ok(Self {
            inner,
            base_url,
            config,
            retry,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Resolve a path such as `products/_search` against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn send(&self, url: Url, payload: String, content_type: &'static str) -> Result<Value> {
        let mut request = self
            .inner
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(payload);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.config.timeout())
            } else {
                TransportError::RequestFailed(e)
            }
        })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::HttpStatus { status, body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(path)?;
        // Owned payload so every retry resends the same bytes
        let payload = serde_json::to_string(body)?;
        debug!(%url, bytes = payload.len(), "Index POST");
        self.retry
            .execute(|| self.send(url.clone(), payload.clone(), "application/json"))
            .await
    }

    async fn post_ndjson(&self, path: &str, lines: &[Value]) -> Result<Value> {
        let url = self.endpoint(path)?;
        let mut payload = String::new();
        for line in lines {
            payload.push_str(&serde_json::to_string(line)?);
            payload.push('\n');
        }
        debug!(%url, lines = lines.len(), "Index NDJSON POST");
        self.retry
            .execute(|| self.send(url.clone(), payload.clone(), NDJSON))
            .await
    }
}

/// Base URLs always end with `/` so relative joins keep their path prefix
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))
}

/// Create a shared transport (Arc-wrapped for cloning)
pub fn shared_transport(config: TransportConfig) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(HttpTransport::new(config)?))
}
