//! Thin JSON-over-HTTP client for list endpoints

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::FetchError;
use crate::config::ApiConfig;

/// HTTP client bound to one API base URL
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        debug!(%base_url, ?timeout, "ApiClient::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, FetchError> {
        debug!(?config, "ApiClient::from_config: called");
        Self::new(&config.base_url, config.timeout())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and decode the body as a JSON array of records
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let url = self.url(path);
        debug!(%url, "ApiClient::get_list: called");

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "ApiClient::get_list: non-success status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let records: Vec<T> =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url: url.clone(), source })?;

        debug!(%url, count = records.len(), "ApiClient::get_list: decoded");
        Ok(records)
    }
}
