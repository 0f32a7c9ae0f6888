//! HTTP peer client
//!
//! Fetches a value from one remote peer over the peer protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::{FetchRequest, FetchResponse};
use crate::peers::PeerGetter;

/// Client for a single peer, addressed by `peer + base_path`.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: String,
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpGetter {
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
            timeout: None,
        }
    }

    /// Bounds every request to this peer by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, req: &FetchRequest) -> String {
        format!("{}{}", self.base_url, req.path())
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let url = self.url_for(req);
        debug!("fetching {}", url);

        let mut request = self.http_client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CacheError::RemoteFetch(format!("request to {url} failed: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(CacheError::RemoteFetch(format!(
                "server returned: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::RemoteFetch(format!("reading response body: {e}")))?;

        FetchResponse::decode(&body)
    }
}
