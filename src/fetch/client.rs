//! HTTP client for downloading schema data

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{FetchError, SchemaFetcher};
use crate::config::FetchConfig;

/// Schema downloader backed by reqwest
pub struct SchemaClient {
    client: Client,
}

impl SchemaClient {
    /// Create a new schema client from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .timeout(config.request_timeout.as_duration())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Io(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SchemaFetcher for SchemaClient {
    async fn fetch(&self, uri: &str) -> Result<String, FetchError> {
        debug!(uri, "Starting schema download");

        let response = self.client.get(uri).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::TimedOut
            } else {
                FetchError::Io(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Io(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(format!("Failed to read body: {}", e)))?;

        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| FetchError::Io(format!("Schema is not valid UTF-8: {}", e)))?;

        debug!(uri, size = text.len(), "Schema download completed");

        Ok(text)
    }
}
